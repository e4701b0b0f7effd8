//! HTTP client for the TFS data store.

use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

use serde::de::DeserializeOwned;

use super::error::SyncError;
use super::SyncSettings;
use crate::api::{ApiResponse, SaveRequest, SyncProbe};
use crate::document::Document;
use crate::resource::Resource;

/// Timeout for the reachability check.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(3);

/// Server-side copy of one resource document.
pub trait Remote<T: Resource>: Send + Sync + 'static {
    /// Fetches the whole document.
    fn fetch(&self) -> impl Future<Output = Result<Document<T>, SyncError>> + Send;

    /// Asks whether the server copy is newer than `last_modified`.
    fn probe(&self, last_modified: i64) -> impl Future<Output = Result<bool, SyncError>> + Send;

    /// Overwrites the server copy and returns the document as stored.
    fn save(
        &self,
        document: &Document<T>,
    ) -> impl Future<Output = Result<Document<T>, SyncError>> + Send;
}

/// [`Remote`] backed by the `/api/{resource}` endpoints.
#[derive(Debug)]
pub struct HttpRemote<T> {
    client: reqwest::Client,
    server_url: String,
    settings: SyncSettings,
    _item: PhantomData<fn() -> T>,
}

impl<T> Clone for HttpRemote<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            server_url: self.server_url.clone(),
            settings: self.settings,
            _item: PhantomData,
        }
    }
}

impl<T: Resource> HttpRemote<T> {
    pub fn new(server_url: impl Into<String>, settings: SyncSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            server_url: server_url.into(),
            settings,
            _item: PhantomData,
        }
    }

    /// Returns the server URL.
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn resource_url(&self) -> String {
        build_http_url(&self.server_url, &format!("/api/{}", T::KIND.name()))
    }
}

impl<T: Resource> Remote<T> for HttpRemote<T> {
    async fn fetch(&self) -> Result<Document<T>, SyncError> {
        let response = self
            .client
            .get(self.resource_url())
            .timeout(self.settings.fetch_timeout)
            .send()
            .await?;

        let envelope: ApiResponse<Document<T>> = read_json(response).await?;
        match envelope {
            ApiResponse {
                success: true,
                data: Some(document),
                ..
            } => Ok(document),
            ApiResponse { success: true, .. } => {
                Err(SyncError::Malformed("response is missing data".to_string()))
            }
            failed => Err(SyncError::Server {
                status: 200,
                message: failed.reason(),
            }),
        }
    }

    async fn probe(&self, last_modified: i64) -> Result<bool, SyncError> {
        let response = self
            .client
            .get(format!("{}/sync", self.resource_url()))
            .query(&[("lastModified", last_modified)])
            .timeout(self.settings.probe_timeout)
            .send()
            .await?;

        let probe: SyncProbe = read_json(response).await?;
        if !probe.success {
            return Err(SyncError::Server {
                status: 200,
                message: probe
                    .error
                    .unwrap_or_else(|| "Sync check failed".to_string()),
            });
        }
        Ok(probe.needs_update)
    }

    async fn save(&self, document: &Document<T>) -> Result<Document<T>, SyncError> {
        let response = self
            .client
            .post(self.resource_url())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&SaveRequest { data: document })
            .timeout(self.settings.save_timeout)
            .send()
            .await?;

        let envelope: ApiResponse<Document<T>> = read_json(response).await?;
        if !envelope.success {
            return Err(SyncError::Server {
                status: 200,
                message: envelope.reason(),
            });
        }
        envelope
            .data
            .ok_or_else(|| SyncError::Malformed("response is missing data".to_string()))
    }
}

/// Decodes a JSON body, turning non-2xx statuses into [`SyncError::Server`]
/// with whatever explanation the body carries.
async fn read_json<B: DeserializeOwned>(response: reqwest::Response) -> Result<B, SyncError> {
    let status = response.status();
    if !status.is_success() {
        let message = match response.json::<ApiResponse<serde_json::Value>>().await {
            Ok(body) => body.reason(),
            Err(_) => format!("Server returned status {}", status),
        };
        return Err(SyncError::Server {
            status: status.as_u16(),
            message,
        });
    }

    response.json::<B>().await.map_err(|e| {
        if e.is_timeout() {
            SyncError::Timeout
        } else {
            SyncError::Malformed(e.to_string())
        }
    })
}

/// Builds an HTTP URL for a given path.
fn build_http_url(server_url: &str, path: &str) -> String {
    let base_url = if !server_url.starts_with("http://") && !server_url.starts_with("https://") {
        format!("http://{}", server_url)
    } else {
        server_url.to_string()
    };

    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Returns true if the server answers its health check.
pub async fn check_server(server_url: &str) -> bool {
    let url = build_http_url(server_url, "/health");
    match reqwest::Client::new()
        .get(&url)
        .timeout(HEALTH_TIMEOUT)
        .send()
        .await
    {
        Ok(response) => response.status().is_success(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Luminary, Sponsor};
    use crate::sync::{ResourceStore, SyncOutcome, UpdateBus};
    use axum::{routing::get, Json, Router};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    fn quick_settings() -> SyncSettings {
        SyncSettings {
            fetch_timeout: Duration::from_millis(200),
            probe_timeout: Duration::from_millis(200),
            save_timeout: Duration::from_millis(200),
            ..SyncSettings::default()
        }
    }

    /// Serves `app` on a local port and returns its base URL.
    async fn serve(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        url
    }

    /// Accepts connections and never answers.
    async fn serve_silence() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        url
    }

    /// Answers every GET and POST on `/api/sponsors` with `body`.
    fn fixed(body: Value) -> Router {
        let get_body = body.clone();
        Router::new().route(
            "/api/sponsors",
            get(move || {
                let body = get_body.clone();
                async move { Json(body) }
            })
            .post(move || {
                let body = body.clone();
                async move { Json(body) }
            }),
        )
    }

    fn sponsor_store(url: String) -> ResourceStore<Sponsor, HttpRemote<Sponsor>> {
        let settings = quick_settings();
        ResourceStore::new(HttpRemote::new(url, settings), settings, UpdateBus::new())
    }

    #[test]
    fn test_build_http_url() {
        assert_eq!(
            build_http_url("http://localhost:8080", "/api/sponsors"),
            "http://localhost:8080/api/sponsors"
        );
        assert_eq!(
            build_http_url("https://tfs.example.com/", "/health"),
            "https://tfs.example.com/health"
        );
        assert_eq!(
            build_http_url("localhost:8080", "/health"),
            "http://localhost:8080/health"
        );
    }

    #[test]
    fn test_resource_url_uses_kind() {
        let sponsors: HttpRemote<Sponsor> =
            HttpRemote::new("http://localhost:8080", SyncSettings::default());
        assert_eq!(sponsors.resource_url(), "http://localhost:8080/api/sponsors");

        let team: HttpRemote<Luminary> = HttpRemote::new("localhost:9000", SyncSettings::default());
        assert_eq!(team.resource_url(), "http://localhost:9000/api/luminaries");
        assert_eq!(team.server_url(), "localhost:9000");
    }

    #[tokio::test]
    async fn test_unreachable_fetch_is_network_error() {
        // Port 9 (discard) is closed on test machines
        let remote: HttpRemote<Sponsor> =
            HttpRemote::new("http://127.0.0.1:9", SyncSettings::default());
        let result = remote.fetch().await;
        assert!(matches!(
            result,
            Err(SyncError::Network(_)) | Err(SyncError::Timeout)
        ));
        assert!(!check_server("http://127.0.0.1:9").await);
    }

    #[tokio::test]
    async fn test_wrong_document_shape_falls_back_to_defaults() {
        let url = serve(fixed(json!({ "success": true, "data": { "foo": 1 } }))).await;

        let remote: HttpRemote<Sponsor> = HttpRemote::new(url.clone(), quick_settings());
        assert!(matches!(remote.fetch().await, Err(SyncError::Malformed(_))));

        let store = sponsor_store(url);
        store.load().await;
        assert_eq!(store.items(), Sponsor::defaults());
    }

    #[tokio::test]
    async fn test_rejected_save_leaves_store_untouched() {
        let url = serve(fixed(json!({ "success": false, "error": "disk full" }))).await;

        let remote: HttpRemote<Sponsor> = HttpRemote::new(url.clone(), quick_settings());
        match remote.save(&Document::defaults()).await {
            Err(SyncError::Server { status, message }) => {
                assert_eq!(status, 200);
                assert_eq!(message, "disk full");
            }
            other => panic!("expected server error, got {:?}", other),
        }

        let store = sponsor_store(url);
        store.load().await;
        let before = store.document();
        let added = store
            .add(Sponsor {
                name: "IQAS".to_string(),
                ..Sponsor::default()
            })
            .await;
        assert!(matches!(added, Err(SyncError::Server { .. })));
        assert_eq!(store.document(), before);
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let url = serve_silence().await;

        let remote: HttpRemote<Sponsor> = HttpRemote::new(url.clone(), quick_settings());
        assert!(matches!(remote.fetch().await, Err(SyncError::Timeout)));
        assert!(matches!(remote.probe(0).await, Err(SyncError::Timeout)));

        let store = sponsor_store(url);
        store.load().await;
        assert_eq!(store.items(), Sponsor::defaults());

        let added = store.add(Sponsor::default()).await;
        assert!(matches!(added, Err(SyncError::Timeout)));
        assert_eq!(store.items(), Sponsor::defaults());

        assert_eq!(store.check_sync().await, SyncOutcome::Unreachable);
    }
}

use serde::{Deserialize, Serialize};

use crate::resource::{Resource, ResourceKind};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Magazine {
    pub id: String,
    pub title: String,
    pub edition: String,
    pub description: String,
    pub cover: String,
    pub articles: u32,
    pub downloads: u32,
    pub read_time: String,
    pub categories: Vec<String>,
    pub highlights: Vec<String>,
    pub link: String,
    pub is_active: bool,
}

impl Magazine {
    pub fn active(magazines: &[Magazine]) -> Vec<&Magazine> {
        magazines.iter().filter(|m| m.is_active).collect()
    }
}

impl Resource for Magazine {
    const KIND: ResourceKind = ResourceKind::Magazines;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn label(&self) -> &str {
        &self.title
    }
}

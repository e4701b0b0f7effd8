//! TFS site backend: the JSON resource store server and the configuration
//! shared by the operator CLI.

pub mod config;
pub mod server;

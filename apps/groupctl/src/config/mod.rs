//! Configuration management for groupctl

mod paths;
mod settings;

pub use paths::{ConfigPaths, CONFIG_DIR_ENV};
pub use settings::{
    load_client_secret, Config, CLIENT_ID_ENV, CLIENT_SECRET_ENV, CLIENT_SECRET_FILE_ENV,
    CLOUD_ENV, GRAPH_URL_ENV, LOGIN_URL_ENV, TENANT_ID_ENV,
};

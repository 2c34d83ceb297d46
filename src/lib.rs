pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod storage;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::config::{Config, DEFAULT_EXPORT_KEY, DEFAULT_MAX_UPLOAD_BYTES};
use crate::error::Result;
use crate::repository::ApplicationRepository;
use crate::storage::{CvStorage, LocalCvStorage};

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn ApplicationRepository>,
    pub storage: Arc<dyn CvStorage>,
    /// Set when CVs live on local disk and `/files` serves them.
    pub local_files: Option<Arc<LocalCvStorage>>,
    pub export_key: String,
    pub cv_namespace: String,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(repository: Arc<dyn ApplicationRepository>, storage: Arc<dyn CvStorage>) -> Self {
        Self {
            repository,
            storage,
            local_files: None,
            export_key: DEFAULT_EXPORT_KEY.to_string(),
            cv_namespace: "cvs".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_local_files(mut self, local: Arc<LocalCvStorage>) -> Self {
        self.local_files = Some(local);
        self
    }

    pub fn with_export_key(mut self, key: &str) -> Self {
        self.export_key = key.to_string();
        self
    }

    pub fn with_cv_namespace(mut self, namespace: &str) -> Self {
        self.cv_namespace = namespace.to_string();
        self
    }

    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// Builds the configured repository and storage adapters.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        let repository = repository::build(config, &http_client).await?;
        let handles = storage::build(config, &http_client).await?;

        let mut state = Self::new(repository, handles.storage)
            .with_export_key(&config.export_key)
            .with_cv_namespace(&config.cv_namespace)
            .with_max_upload_bytes(config.max_upload_bytes);
        if let Some(local) = handles.local {
            state = state.with_local_files(local);
        }
        Ok(state)
    }
}

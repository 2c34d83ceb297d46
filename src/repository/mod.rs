//! Interchangeable stores for submitted applications.

mod memory;
mod postgres;
mod sheets;
mod supabase;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::{ApplicationBackend, Config};
use crate::error::Result;
use crate::models::application::{ApplicationRecord, NewApplication};
use crate::services::google_auth::{GoogleAuth, ServiceAccountKey, SHEETS_SCOPE};

pub use memory::MemoryApplicationRepository;
pub use postgres::PgApplicationRepository;
pub use sheets::SheetsApplicationRepository;
pub use supabase::SupabaseApplicationRepository;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Records one application. Errors carry the backend's own message.
    async fn insert(&self, application: &NewApplication) -> Result<()>;

    /// All applications, most recent first.
    async fn list_all(&self) -> Result<Vec<ApplicationRecord>>;
}

pub async fn build(config: &Config, client: &Client) -> Result<Arc<dyn ApplicationRepository>> {
    let repository: Arc<dyn ApplicationRepository> = match config.application_backend {
        ApplicationBackend::Postgres => {
            let url = config.require(&config.database_url, "DATABASE_URL")?;
            let pool = crate::database::pool::create_pool(url).await?;
            Arc::new(PgApplicationRepository::new(pool))
        }
        ApplicationBackend::Sheets => {
            let sheet_id = config.require(&config.sheets_id, "GOOGLE_SHEETS_ID")?;
            let creds = config.require(
                &config.google_credentials_base64,
                "GOOGLE_CLOUD_CREDENTIALS_BASE64",
            )?;
            let auth = GoogleAuth::new(
                client.clone(),
                ServiceAccountKey::from_base64(creds)?,
                &[SHEETS_SCOPE],
            );
            Arc::new(SheetsApplicationRepository::new(
                client.clone(),
                auth,
                sheet_id,
                &config.sheets_range,
            ))
        }
        ApplicationBackend::Supabase => {
            let url = config.require(&config.supabase_url, "SUPABASE_URL")?;
            let role = config.require(&config.supabase_service_role, "SUPABASE_SERVICE_ROLE")?;
            Arc::new(SupabaseApplicationRepository::new(client.clone(), url, role))
        }
        ApplicationBackend::Memory => {
            tracing::warn!("Using in-memory application store; submissions are lost on restart");
            Arc::new(MemoryApplicationRepository::default())
        }
    };
    tracing::info!(backend = ?config.application_backend, "Application repository ready");
    Ok(repository)
}

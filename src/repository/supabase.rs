use async_trait::async_trait;
use reqwest::Client;

use super::ApplicationRepository;
use crate::error::{Error, Result};
use crate::models::application::{ApplicationRecord, NewApplication};

/// Document-store adapter speaking the Supabase REST dialect.
#[derive(Clone)]
pub struct SupabaseApplicationRepository {
    client: Client,
    table_url: String,
    service_role: String,
}

impl SupabaseApplicationRepository {
    pub fn new(client: Client, base_url: &str, service_role: &str) -> Self {
        Self {
            client,
            table_url: format!("{}/rest/v1/applications", base_url.trim_end_matches('/')),
            service_role: service_role.to_string(),
        }
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.service_role)
            .bearer_auth(&self.service_role)
    }
}

#[async_trait]
impl ApplicationRepository for SupabaseApplicationRepository {
    async fn insert(&self, application: &NewApplication) -> Result<()> {
        let resp = self
            .authorized(self.client.post(&self.table_url))
            .header("Prefer", "return=minimal")
            .json(application)
            .send()
            .await?;

        if !resp.status().is_success() {
            let message = crate::utils::http::error_message(resp, "Insert failed").await;
            tracing::error!(error = %message, "Document store rejected application");
            return Err(Error::Backend(message));
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<ApplicationRecord>> {
        let resp = self
            .authorized(self.client.get(&self.table_url))
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await?;

        if !resp.status().is_success() {
            let message = crate::utils::http::error_message(resp, "Export failed").await;
            return Err(Error::Backend(message));
        }
        Ok(resp.json::<Vec<ApplicationRecord>>().await?)
    }
}

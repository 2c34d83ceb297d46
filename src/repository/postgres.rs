use async_trait::async_trait;
use sqlx::PgPool;

use super::ApplicationRepository;
use crate::error::Result;
use crate::models::application::{ApplicationRecord, NewApplication};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS applications (
        id BIGSERIAL PRIMARY KEY,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        job_id TEXT,
        job_title TEXT,
        company TEXT,
        location TEXT,
        type TEXT,
        tags TEXT,
        name TEXT,
        email TEXT,
        phone TEXT,
        cv_url TEXT,
        cv_blob_id TEXT
    )
"#;

#[derive(Clone)]
pub struct PgApplicationRepository {
    pool: PgPool,
}

impl PgApplicationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_table(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl ApplicationRepository for PgApplicationRepository {
    async fn insert(&self, application: &NewApplication) -> Result<()> {
        self.ensure_table().await?;
        sqlx::query(
            r#"
            INSERT INTO applications
                (job_id, job_title, company, location, type, tags, name, email, phone, cv_url, cv_blob_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(&application.job_id)
        .bind(&application.job_title)
        .bind(&application.company)
        .bind(&application.location)
        .bind(&application.job_type)
        .bind(&application.tags)
        .bind(&application.name)
        .bind(&application.email)
        .bind(&application.phone)
        .bind(&application.cv_url)
        .bind(&application.cv_blob_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<ApplicationRecord>> {
        self.ensure_table().await?;
        let rows = sqlx::query_as::<_, ApplicationRecord>(
            r#"
            SELECT id, created_at, job_id, job_title, company, location, type, tags,
                   name, email, phone, cv_url, cv_blob_id
            FROM applications
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

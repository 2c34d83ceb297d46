use async_trait::async_trait;
use tokio::sync::RwLock;

use super::ApplicationRepository;
use crate::error::Result;
use crate::models::application::{ApplicationRecord, NewApplication};

/// Process-local store for development and tests.
#[derive(Default)]
pub struct MemoryApplicationRepository {
    rows: RwLock<Vec<ApplicationRecord>>,
}

impl MemoryApplicationRepository {
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl ApplicationRepository for MemoryApplicationRepository {
    async fn insert(&self, application: &NewApplication) -> Result<()> {
        let mut rows = self.rows.write().await;
        let id = rows.len() as i64 + 1;
        rows.push(application.clone().into_record(id, crate::utils::time::now()));
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<ApplicationRecord>> {
        let mut rows = self.rows.read().await.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_newest_first() {
        let repo = MemoryApplicationRepository::default();
        for name in ["first", "second", "third"] {
            repo.insert(&NewApplication {
                name: name.into(),
                ..Default::default()
            })
            .await
            .unwrap();
        }
        let names: Vec<String> = repo
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .filter_map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["third", "second", "first"]);
        assert_eq!(repo.len().await, 3);
    }
}

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use boardkeeper_common::AppError;

use crate::config::DirectoryConfig;
use crate::models::ContentRef;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentInfo {
    pub owner_id: Uuid,
    pub body: String,
}

/// Lookups against the content and identity services this engine moderates.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn lookup_content(&self, target: ContentRef) -> Result<Option<ContentInfo>, AppError>;

    async fn member_exists(&self, member_id: Uuid) -> Result<bool, AppError>;

    async fn require_content(&self, target: ContentRef) -> Result<ContentInfo, AppError> {
        self.lookup_content(target)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Content {} not found", target)))
    }

    async fn require_member(&self, member_id: Uuid) -> Result<(), AppError> {
        if self.member_exists(member_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Member {} not found", member_id)))
        }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryDirectory {
    content: Arc<RwLock<HashMap<ContentRef, ContentInfo>>>,
    members: Arc<RwLock<HashSet<Uuid>>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_member(&self, member_id: Uuid) {
        if let Ok(mut members) = self.members.write() {
            members.insert(member_id);
        }
    }

    /// Registers content and its owner.
    pub fn add_content(&self, target: ContentRef, owner_id: Uuid, body: impl Into<String>) {
        self.add_member(owner_id);
        if let Ok(mut content) = self.content.write() {
            content.insert(target, ContentInfo { owner_id, body: body.into() });
        }
    }

    pub fn edit_content(&self, target: ContentRef, body: impl Into<String>) {
        if let Ok(mut content) = self.content.write() {
            if let Some(info) = content.get_mut(&target) {
                info.body = body.into();
            }
        }
    }

    pub fn remove_content(&self, target: ContentRef) {
        if let Ok(mut content) = self.content.write() {
            content.remove(&target);
        }
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn lookup_content(&self, target: ContentRef) -> Result<Option<ContentInfo>, AppError> {
        let content = self
            .content
            .read()
            .map_err(|_| AppError::Internal("Content directory lock poisoned".to_string()))?;
        Ok(content.get(&target).cloned())
    }

    async fn member_exists(&self, member_id: Uuid) -> Result<bool, AppError> {
        let members = self
            .members
            .read()
            .map_err(|_| AppError::Internal("Member directory lock poisoned".to_string()))?;
        Ok(members.contains(&member_id))
    }
}

/// Talks to the content service over HTTP. A 404 means "does not exist".
#[derive(Clone)]
pub struct HttpDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDirectory {
    pub fn new(base_url: &str, config: &DirectoryConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get(&self, path: &str) -> Result<Option<reqwest::Response>, AppError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Content service unreachable: {}", e)))?;

        match response.status() {
            reqwest::StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response)),
            status => {
                tracing::warn!("Content service returned {} for {}", status, url);
                Err(AppError::ExternalService(format!(
                    "Content service returned {}",
                    status
                )))
            }
        }
    }
}

#[async_trait]
impl Directory for HttpDirectory {
    async fn lookup_content(&self, target: ContentRef) -> Result<Option<ContentInfo>, AppError> {
        let path = format!("/content/{}/{}", target.kind().as_str(), target.id());
        match self.get(&path).await? {
            Some(response) => {
                let info = response.json::<ContentInfo>().await.map_err(|e| {
                    AppError::ExternalService(format!("Malformed content response: {}", e))
                })?;
                Ok(Some(info))
            }
            None => Ok(None),
        }
    }

    async fn member_exists(&self, member_id: Uuid) -> Result<bool, AppError> {
        Ok(self.get(&format!("/members/{}", member_id)).await?.is_some())
    }
}

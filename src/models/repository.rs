//! Repository, collaborator and review response models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::{collaborator, repository, review};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RepositoryResponse {
    pub id: i64,
    pub name: String,
    pub owner: String,
    pub owner_id: i64,
    pub installation_id: Option<i64>,
    pub enabled: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<repository::Model> for RepositoryResponse {
    fn from(m: repository::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            owner: m.owner,
            owner_id: m.owner_id,
            installation_id: m.installation_id,
            enabled: m.enabled,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CollaboratorResponse {
    pub github_user_id: i64,
    pub github_login: String,
    pub role: String,
    pub is_registered_user: bool,
}

impl From<collaborator::Model> for CollaboratorResponse {
    fn from(m: collaborator::Model) -> Self {
        Self {
            github_user_id: m.github_user_id,
            github_login: m.github_login,
            role: m.role,
            is_registered_user: m.is_registered_user,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReviewResponse {
    pub id: i64,
    pub repository_id: i64,
    pub pull_request_number: i32,
    pub content: String,
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<review::Model> for ReviewResponse {
    fn from(m: review::Model) -> Self {
        Self {
            id: m.id,
            repository_id: m.repository_id,
            pull_request_number: m.pull_request_number,
            content: m.content,
            is_open: m.is_open,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Repository with its collaborators and reviews.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RepositoryDetailResponse {
    pub repository: RepositoryResponse,
    pub collaborators: Vec<CollaboratorResponse>,
    pub reviews: Vec<ReviewResponse>,
}

/// Repositories visible to the caller.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RepositoryListResponse {
    pub owned: Vec<RepositoryResponse>,
    pub collaborating: Vec<RepositoryResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CollaboratorListResponse {
    pub collaborators: Vec<CollaboratorResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReviewListResponse {
    pub reviews: Vec<ReviewResponse>,
}

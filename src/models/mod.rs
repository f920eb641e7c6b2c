//! Request, response and payload models.

pub mod account;
pub mod github;
pub mod repository;
pub mod webhook;

pub use account::{
    AccountResponse, LinkInstallationRequest, LoginRequest, SessionClaims, SessionStatusResponse,
    SignupRequest,
};
pub use github::{
    AccessTokenResponse, GitHubAccount, GitHubCollaborator, GitHubInstallation, GitHubRepository,
};
pub use repository::{
    CollaboratorListResponse, CollaboratorResponse, RepositoryDetailResponse,
    RepositoryListResponse, RepositoryResponse, ReviewListResponse, ReviewResponse,
};
pub use webhook::{WebhookEvent, WebhookParseError};

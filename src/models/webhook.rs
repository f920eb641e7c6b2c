//! Typed GitHub webhook payloads.
//!
//! `WebhookEvent` is the closed set of event kinds the server handles. Parsing
//! keys off the `X-GitHub-Event` header; anything else is rejected before any
//! state is touched.

use serde::Deserialize;

use super::github::{GitHubAccount, GitHubRepository};
use crate::error::AppError;

/// Role given to a member-added collaborator when the payload carries none.
pub const DEFAULT_MEMBER_ROLE: &str = "read";

/// Declares a webhook `action` enum that keeps unknown values.
macro_rules! webhook_action {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
        #[serde(from = "String")]
        pub enum $name {
            $($variant,)+
            Other(String),
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                let known = match value.as_str() {
                    $($wire => Some(Self::$variant),)+
                    _ => None,
                };
                known.unwrap_or_else(|| Self::Other(value))
            }
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Other(value) => value,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

webhook_action!(PullRequestAction {
    Opened => "opened",
    Synchronize => "synchronize",
    Reopened => "reopened",
    Closed => "closed",
});

webhook_action!(InstallationAction {
    Created => "created",
    NewPermissionsAccepted => "new_permissions_accepted",
    Deleted => "deleted",
    Suspend => "suspend",
    Unsuspend => "unsuspend",
});

webhook_action!(InstallationTargetAction {
    Renamed => "renamed",
});

webhook_action!(RepositoryAction {
    Created => "created",
    Deleted => "deleted",
    Renamed => "renamed",
    Transferred => "transferred",
});

webhook_action!(InstallationRepositoriesAction {
    Added => "added",
    Removed => "removed",
});

webhook_action!(MemberAction {
    Added => "added",
    Edited => "edited",
    Removed => "removed",
});

/// Installation reference carried by most payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct InstallationRef {
    pub id: i64,
    #[serde(default)]
    pub account: Option<GitHubAccount>,
}

/// Minimal repository reference listed by installation payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryRef {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestRef {
    pub number: i32,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    pub action: PullRequestAction,
    pub number: i32,
    pub pull_request: PullRequestRef,
    pub repository: GitHubRepository,
    #[serde(default)]
    pub installation: Option<InstallationRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstallationEvent {
    pub action: InstallationAction,
    pub installation: InstallationRef,
    #[serde(default)]
    pub repositories: Option<Vec<RepositoryRef>>,
}

impl InstallationEvent {
    pub fn repositories(&self) -> &[RepositoryRef] {
        self.repositories.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstallationTargetEvent {
    pub action: InstallationTargetAction,
    pub installation: InstallationRef,
    /// The account after the rename
    pub account: GitHubAccount,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryEvent {
    pub action: RepositoryAction,
    pub repository: GitHubRepository,
    #[serde(default)]
    pub installation: Option<InstallationRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstallationRepositoriesEvent {
    pub action: InstallationRepositoriesAction,
    pub installation: InstallationRef,
    #[serde(default)]
    pub repositories_added: Option<Vec<RepositoryRef>>,
    #[serde(default)]
    pub repositories_removed: Option<Vec<RepositoryRef>>,
}

impl InstallationRepositoriesEvent {
    pub fn added(&self) -> &[RepositoryRef] {
        self.repositories_added.as_deref().unwrap_or_default()
    }

    pub fn removed(&self) -> &[RepositoryRef] {
        self.repositories_removed.as_deref().unwrap_or_default()
    }
}

/// A `from`/`to` pair in a `changes` object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberChanges {
    #[serde(default)]
    pub permission: Option<Change>,
    #[serde(default)]
    pub role_name: Option<Change>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemberEvent {
    pub action: MemberAction,
    pub member: GitHubAccount,
    pub repository: GitHubRepository,
    #[serde(default)]
    pub changes: Option<MemberChanges>,
}

impl MemberEvent {
    /// The role the member now holds, if the payload says.
    pub fn new_role(&self) -> Option<&str> {
        let changes = self.changes.as_ref()?;
        changes
            .permission
            .as_ref()
            .and_then(|c| c.to.as_deref())
            .or_else(|| changes.role_name.as_ref().and_then(|c| c.to.as_deref()))
    }
}

/// A parsed webhook delivery.
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    PullRequest(PullRequestEvent),
    Installation(InstallationEvent),
    InstallationTarget(InstallationTargetEvent),
    Repository(RepositoryEvent),
    Member(MemberEvent),
    InstallationRepositories(InstallationRepositoriesEvent),
}

impl WebhookEvent {
    /// Decode a raw body according to the event-type header.
    pub fn parse(event_type: &str, body: &[u8]) -> Result<Self, WebhookParseError> {
        let event = match event_type {
            "pull_request" => Self::PullRequest(decode(event_type, body)?),
            "installation" => Self::Installation(decode(event_type, body)?),
            "installation_target" => Self::InstallationTarget(decode(event_type, body)?),
            "repository" => Self::Repository(decode(event_type, body)?),
            "member" => Self::Member(decode(event_type, body)?),
            "installation_repositories" => {
                Self::InstallationRepositories(decode(event_type, body)?)
            }
            other => return Err(WebhookParseError::UnsupportedEvent(other.to_string())),
        };
        Ok(event)
    }

    /// The `X-GitHub-Event` name of this event.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PullRequest(_) => "pull_request",
            Self::Installation(_) => "installation",
            Self::InstallationTarget(_) => "installation_target",
            Self::Repository(_) => "repository",
            Self::Member(_) => "member",
            Self::InstallationRepositories(_) => "installation_repositories",
        }
    }

    pub fn action(&self) -> &str {
        match self {
            Self::PullRequest(e) => e.action.as_str(),
            Self::Installation(e) => e.action.as_str(),
            Self::InstallationTarget(e) => e.action.as_str(),
            Self::Repository(e) => e.action.as_str(),
            Self::Member(e) => e.action.as_str(),
            Self::InstallationRepositories(e) => e.action.as_str(),
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    event_type: &str,
    body: &[u8],
) -> Result<T, WebhookParseError> {
    serde_json::from_slice(body).map_err(|source| WebhookParseError::Malformed {
        event_type: event_type.to_string(),
        source,
    })
}

/// Webhook decoding failures.
#[derive(Debug, thiserror::Error)]
pub enum WebhookParseError {
    #[error("Missing X-GitHub-Event header")]
    MissingEventType,

    #[error("Unsupported event type: {0}")]
    UnsupportedEvent(String),

    #[error("Malformed {event_type} payload: {source}")]
    Malformed {
        event_type: String,
        source: serde_json::Error,
    },
}

impl From<WebhookParseError> for AppError {
    fn from(err: WebhookParseError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

//! Repository access checks for session callers.

use tracing::debug;

use crate::db::DbPool;
use crate::entity::{account, repository};
use crate::error::{AppError, AppResult};

/// Decide whether an account may read a repository.
///
/// Owners match on the GitHub account id stored on the repository. Everyone
/// else needs a collaborator row linked to their local account id.
pub async fn has_access(
    db: &DbPool,
    repository: &repository::Model,
    caller: &account::Model,
) -> AppResult<bool> {
    if caller.github_id == Some(repository.owner_id) {
        return Ok(true);
    }

    db.is_linked_collaborator(repository.id, caller.id).await
}

/// Load an enabled repository the caller may read.
///
/// Unknown and disabled repositories are `NotFound`; a known repository the
/// caller has no access to is `Forbidden`.
pub async fn authorize_repository(
    db: &DbPool,
    repository_id: i64,
    account_id: i64,
) -> AppResult<repository::Model> {
    let caller = db
        .find_account_by_id(account_id)
        .await?
        .filter(|a| a.enabled)
        .ok_or_else(|| AppError::Unauthorized("Account is not active".to_string()))?;

    let repository = db
        .find_repository(repository_id)
        .await?
        .filter(|r| r.enabled)
        .ok_or_else(|| AppError::NotFound(format!("Repository {}", repository_id)))?;

    if !has_access(db, &repository, &caller).await? {
        debug!(repository_id, account_id, "Repository access denied");
        return Err(AppError::Forbidden(format!(
            "No access to repository {}",
            repository_id
        )));
    }

    Ok(repository)
}

//! Mirror of installations, repositories and collaborators.
//!
//! Each handler applies one webhook delivery to the local tables. Writes are
//! committed one by one; a failure part way through a batch leaves earlier
//! writes in place and surfaces as an error so GitHub redelivers. Every
//! create is a check-then-insert, so a redelivery converges on the same rows.

use secrecy::SecretString;
use tracing::{debug, info, warn};

use super::credentials::CredentialProvider;
use crate::db::DbPool;
use crate::db::collaborators::CollaboratorRecord;
use crate::db::repositories::RepositoryRecord;
use crate::error::{AppError, AppResult};
use crate::models::webhook::{
    DEFAULT_MEMBER_ROLE, InstallationAction, InstallationEvent, InstallationRepositoriesAction,
    InstallationRepositoriesEvent, InstallationTargetAction, InstallationTargetEvent, MemberAction,
    MemberEvent, RepositoryAction, RepositoryEvent, RepositoryRef,
};
use crate::models::{GitHubCollaborator, GitHubRepository};

/// How an imported repository treats an existing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImportMode {
    /// Leave rows already mirrored for this installation untouched and skip
    /// the GitHub fetch. Rows that are disabled or owned by another
    /// installation id are refreshed, so a reinstall adopts them.
    SkipExisting,
    /// Refresh existing rows and re-enable them.
    Refresh,
}

/// Applies installation, repository and membership events to the database.
#[derive(Clone)]
pub struct SyncEngine {
    db: DbPool,
    credentials: CredentialProvider,
}

impl SyncEngine {
    pub fn new(db: DbPool, credentials: CredentialProvider) -> Self {
        Self { db, credentials }
    }

    pub async fn handle_installation(&self, event: &InstallationEvent) -> AppResult<()> {
        let installation_id = event.installation.id;

        match &event.action {
            InstallationAction::Created | InstallationAction::NewPermissionsAccepted => {
                let imported = self
                    .import_repositories(installation_id, event.repositories(), ImportMode::SkipExisting)
                    .await?;
                info!(
                    installation_id,
                    listed = event.repositories().len(),
                    imported,
                    "Installation repositories imported"
                );
            }
            InstallationAction::Deleted | InstallationAction::Suspend => {
                let disabled = self
                    .db
                    .set_installation_repositories_enabled(installation_id, false)
                    .await?;
                info!(installation_id, disabled, action = %event.action, "Installation repositories disabled");
            }
            InstallationAction::Unsuspend => {
                let enabled = self
                    .db
                    .set_installation_repositories_enabled(installation_id, true)
                    .await?;
                info!(installation_id, enabled, "Installation repositories enabled");
            }
            InstallationAction::Other(action) => {
                debug!(installation_id, action = %action, "Ignoring installation action");
            }
        }

        Ok(())
    }

    pub async fn handle_installation_target(
        &self,
        event: &InstallationTargetEvent,
    ) -> AppResult<()> {
        let installation_id = event.installation.id;

        match &event.action {
            InstallationTargetAction::Renamed => {
                let updated = self
                    .db
                    .rename_installation_owner(installation_id, &event.account.login)
                    .await?;
                info!(
                    installation_id,
                    owner = %event.account.login,
                    updated,
                    "Installation account renamed"
                );
            }
            InstallationTargetAction::Other(action) => {
                debug!(installation_id, action = %action, "Ignoring installation_target action");
            }
        }

        Ok(())
    }

    pub async fn handle_repository(&self, event: &RepositoryEvent) -> AppResult<()> {
        let repo = &event.repository;

        match &event.action {
            RepositoryAction::Created => {
                let record = repository_record(repo, event.installation.as_ref().map(|i| i.id));
                if self.db.insert_repository_if_absent(&record).await? {
                    info!(repository_id = repo.id, name = %repo.name, "Repository created");
                } else {
                    debug!(repository_id = repo.id, "Repository already known");
                }
            }
            RepositoryAction::Deleted => {
                let removed = self.db.delete_repository(repo.id).await?;
                info!(repository_id = repo.id, removed, "Repository deleted");
            }
            RepositoryAction::Renamed => {
                let updated = self.db.rename_repository(repo.id, &repo.name).await?;
                info!(repository_id = repo.id, name = %repo.name, updated, "Repository renamed");
            }
            RepositoryAction::Transferred => {
                let updated = self
                    .db
                    .transfer_repository(repo.id, &repo.owner.login, repo.owner.id)
                    .await?;
                info!(
                    repository_id = repo.id,
                    owner = %repo.owner.login,
                    owner_id = repo.owner.id,
                    updated,
                    "Repository transferred"
                );
            }
            RepositoryAction::Other(action) => {
                debug!(repository_id = repo.id, action = %action, "Ignoring repository action");
            }
        }

        Ok(())
    }

    pub async fn handle_installation_repositories(
        &self,
        event: &InstallationRepositoriesEvent,
    ) -> AppResult<()> {
        let installation_id = event.installation.id;

        match &event.action {
            InstallationRepositoriesAction::Added => {
                let imported = self
                    .import_repositories(installation_id, event.added(), ImportMode::Refresh)
                    .await?;
                info!(installation_id, imported, "Repositories added to installation");
            }
            InstallationRepositoriesAction::Removed => {
                for repo in event.removed() {
                    self.db.set_repository_enabled(repo.id, false).await?;
                    info!(installation_id, repository_id = repo.id, "Repository removed from installation");
                }
            }
            InstallationRepositoriesAction::Other(action) => {
                debug!(installation_id, action = %action, "Ignoring installation_repositories action");
            }
        }

        Ok(())
    }

    pub async fn handle_member(&self, event: &MemberEvent) -> AppResult<()> {
        let repository_id = event.repository.id;
        let member = &event.member;

        match &event.action {
            MemberAction::Added => {
                if self.db.find_repository(repository_id).await?.is_none() {
                    warn!(
                        repository_id,
                        github_user_id = member.id,
                        "Member added to unknown repository, skipping"
                    );
                    return Ok(());
                }

                let role = event.new_role().unwrap_or(DEFAULT_MEMBER_ROLE);
                let record = CollaboratorRecord {
                    repository_id,
                    github_user_id: member.id,
                    github_login: member.login.clone(),
                    role: role.to_string(),
                    account_id: self.resolve_account(member.id).await?,
                };
                self.db.upsert_collaborator(&record).await?;
                info!(
                    repository_id,
                    github_user_id = member.id,
                    role,
                    registered = record.account_id.is_some(),
                    "Collaborator added"
                );
            }
            MemberAction::Edited => {
                let Some(role) = event.new_role() else {
                    warn!(
                        repository_id,
                        github_user_id = member.id,
                        "Member edited without a role change, ignoring"
                    );
                    return Ok(());
                };
                let updated = self
                    .db
                    .update_collaborator_role(repository_id, member.id, role)
                    .await?;
                info!(repository_id, github_user_id = member.id, role, updated, "Collaborator role changed");
            }
            MemberAction::Removed => {
                let removed = self.db.delete_collaborator(repository_id, member.id).await?;
                info!(repository_id, github_user_id = member.id, removed, "Collaborator removed");
            }
            MemberAction::Other(action) => {
                debug!(repository_id, action = %action, "Ignoring member action");
            }
        }

        Ok(())
    }

    /// Fetch and store the listed repositories with their collaborators.
    ///
    /// The installation token is requested only once something needs
    /// fetching. Returns the number of repositories written.
    async fn import_repositories(
        &self,
        installation_id: i64,
        repositories: &[RepositoryRef],
        mode: ImportMode,
    ) -> AppResult<usize> {
        let mut pending = Vec::new();
        for listed in repositories {
            if mode == ImportMode::SkipExisting
                && let Some(existing) = self.db.find_repository(listed.id).await?
                && existing.enabled
                && existing.installation_id == Some(installation_id)
            {
                debug!(installation_id, repository_id = listed.id, "Repository already imported");
                continue;
            }
            pending.push(listed.id);
        }

        if pending.is_empty() {
            return Ok(0);
        }

        let token = self.credentials.installation_token(installation_id).await?.token;
        for repository_id in &pending {
            self.import_repository(installation_id, *repository_id, &token)
                .await?;
        }

        Ok(pending.len())
    }

    async fn import_repository(
        &self,
        installation_id: i64,
        repository_id: i64,
        token: &SecretString,
    ) -> AppResult<()> {
        let github = self.credentials.github();
        let repo = github.get_repository(token, repository_id).await?;
        let collaborators = github
            .list_collaborators(token, &repo.owner.login, &repo.name)
            .await?;

        self.db
            .upsert_repository(&repository_record(&repo, Some(installation_id)))
            .await?;

        for collaborator in &collaborators {
            self.store_collaborator(repo.id, collaborator).await?;
        }

        info!(
            installation_id,
            repository_id = repo.id,
            collaborators = collaborators.len(),
            "Repository imported"
        );
        Ok(())
    }

    async fn store_collaborator(
        &self,
        repository_id: i64,
        collaborator: &GitHubCollaborator,
    ) -> AppResult<()> {
        let record = CollaboratorRecord {
            repository_id,
            github_user_id: collaborator.id,
            github_login: collaborator.login.clone(),
            role: collaborator
                .role_name
                .clone()
                .unwrap_or_else(|| DEFAULT_MEMBER_ROLE.to_string()),
            account_id: self.resolve_account(collaborator.id).await?,
        };
        self.db.upsert_collaborator(&record).await?;
        Ok(())
    }

    /// Local account linked to a GitHub user.
    ///
    /// Not found is `None`. A database failure aborts the caller.
    async fn resolve_account(&self, github_user_id: i64) -> AppResult<Option<i64>> {
        let account = self
            .db
            .find_account_by_github_id(github_user_id)
            .await
            .map_err(|e| {
                AppError::Database(format!(
                    "Failed to look up account for GitHub user {}: {}",
                    github_user_id, e
                ))
            })?;
        Ok(account.map(|a| a.id))
    }
}

fn repository_record(repo: &GitHubRepository, installation_id: Option<i64>) -> RepositoryRecord {
    RepositoryRecord {
        id: repo.id,
        name: repo.name.clone(),
        owner: repo.owner.login.clone(),
        owner_id: repo.owner.id,
        installation_id,
    }
}

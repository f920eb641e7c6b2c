//! Migration: Create collaborators table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE collaborators (
                    id BIGSERIAL PRIMARY KEY,
                    repository_id BIGINT NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
                    github_user_id BIGINT NOT NULL,
                    github_login VARCHAR(255) NOT NULL,
                    role VARCHAR(50) NOT NULL,
                    account_id BIGINT REFERENCES accounts(id) ON DELETE SET NULL,
                    is_registered_user BOOLEAN NOT NULL DEFAULT FALSE,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE UNIQUE INDEX idx_collaborators_repository_user
                    ON collaborators(repository_id, github_user_id);
                CREATE INDEX idx_collaborators_account_id ON collaborators(account_id);
                CREATE INDEX idx_collaborators_github_user_id ON collaborators(github_user_id);

                CREATE TRIGGER update_collaborators_updated_at
                    BEFORE UPDATE ON collaborators
                    FOR EACH ROW
                    EXECUTE FUNCTION update_updated_at_column();
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DROP TRIGGER IF EXISTS update_collaborators_updated_at ON collaborators;
                DROP TABLE IF EXISTS collaborators CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}

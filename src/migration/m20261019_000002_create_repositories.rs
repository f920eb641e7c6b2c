//! Migration: Create repositories table.
//!
//! Keyed by GitHub's repository id rather than a generated id.

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
                CREATE TABLE repositories (
                    id BIGINT PRIMARY KEY,
                    name VARCHAR(255) NOT NULL,
                    owner VARCHAR(255) NOT NULL,
                    owner_id BIGINT NOT NULL,
                    installation_id BIGINT,
                    enabled BOOLEAN NOT NULL DEFAULT TRUE,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE INDEX idx_repositories_installation_id ON repositories(installation_id);
                CREATE INDEX idx_repositories_owner_id ON repositories(owner_id);

                CREATE TRIGGER update_repositories_updated_at
                    BEFORE UPDATE ON repositories
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
                DROP TRIGGER IF EXISTS update_repositories_updated_at ON repositories;
                DROP TABLE IF EXISTS repositories CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}

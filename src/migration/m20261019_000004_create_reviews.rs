//! Migration: Create reviews table.
//!
//! No uniqueness on (repository_id, pull_request_number): reviews may
//! accumulate per pull request.

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
                CREATE TABLE reviews (
                    id BIGSERIAL PRIMARY KEY,
                    repository_id BIGINT NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
                    pull_request_number INTEGER NOT NULL,
                    content TEXT NOT NULL,
                    is_open BOOLEAN NOT NULL DEFAULT TRUE,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE INDEX idx_reviews_repository_pr
                    ON reviews(repository_id, pull_request_number);

                CREATE TRIGGER update_reviews_updated_at
                    BEFORE UPDATE ON reviews
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
                DROP TRIGGER IF EXISTS update_reviews_updated_at ON reviews;
                DROP TABLE IF EXISTS reviews CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}

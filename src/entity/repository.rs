//! Repository entity mirrored from GitHub.
//!
//! The primary key is GitHub's repository id. Ownership is recorded by the
//! owner's GitHub account id, not by a local account id.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "repositories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub name: String,
    /// Owner login
    pub owner: String,
    /// Owner GitHub account id
    pub owner_id: i64,
    pub installation_id: Option<i64>,
    pub enabled: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

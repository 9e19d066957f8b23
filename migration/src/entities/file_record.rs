//! Uploaded file metadata entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "files")]
pub struct Model {
    /// Generated token plus extension; also the blob file name
    #[sea_orm(primary_key, auto_increment = false)]
    pub identifier: String,
    #[sea_orm(column_type = "Text")]
    pub display_name: String,
    pub expires_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

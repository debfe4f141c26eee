use sea_orm::entity::prelude::*;

/// One row per synced target day. The primary key is the race guard.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "drive_sync_days")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub target_day: Date,
    pub row_count: i64,
    pub synced_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

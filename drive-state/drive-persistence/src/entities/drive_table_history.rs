use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "drive_table_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub run_id: Uuid,
    pub target_day: Date,
    pub pipeline_id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub pipeline_name: String,
    pub audit_result: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub snapshot: Json,
    pub synced_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

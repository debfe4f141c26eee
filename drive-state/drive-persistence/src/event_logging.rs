use drive_common::{
    error::Error,
    event::{EventSeverity, EventType},
};
use sea_orm::{ActiveValue::Set, ConnectionTrait, DbErr, EntityTrait};
use uuid::Uuid;

use crate::{db::now, entities::event_log, mapping::db_error_to_domain};

fn event_model(
    run_id: Option<Uuid>,
    event_type: EventType,
    severity: EventSeverity,
    message: Option<String>,
    metadata: Option<serde_json::Value>,
) -> event_log::ActiveModel {
    event_log::ActiveModel {
        event_id: Set(Uuid::new_v4()),
        run_id: Set(run_id),
        timestamp: Set(now().into()),
        event_type: Set(event_type.to_string()),
        severity: Set(severity.to_string()),
        message: Set(message),
        metadata: Set(metadata),
    }
}

/// Records an event as part of the caller's transaction.
pub(crate) async fn log_event_in_txn<C: ConnectionTrait>(
    txn: &C,
    run_id: Option<Uuid>,
    event_type: EventType,
    message: Option<String>,
    metadata: Option<serde_json::Value>,
) -> Result<(), DbErr> {
    let event = event_model(
        run_id,
        event_type,
        EventSeverity::from(event_type),
        message,
        metadata,
    );

    event_log::Entity::insert(event)
        .exec_without_returning(txn)
        .await?;

    Ok(())
}

/// Records an event outside of any transaction, typically after one
/// was rolled back.
pub(crate) async fn log_event_direct(
    conn: &sea_orm::DatabaseConnection,
    run_id: Option<Uuid>,
    event_type: EventType,
    severity: EventSeverity,
    message: Option<String>,
    metadata: Option<serde_json::Value>,
) -> Result<(), Error> {
    let event = event_model(run_id, event_type, severity, message, metadata);

    event_log::Entity::insert(event)
        .exec_without_returning(conn)
        .await
        .map_err(db_error_to_domain)?;

    Ok(())
}

use async_trait::async_trait;
use drive_common::{
    error::Error,
    event::{EventLogRecord, EventSeverity, EventType},
    state::BaseDbTrait,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use uuid::Uuid;

use crate::{
    db::LedgerStateDb,
    entities::event_log,
    event_logging::log_event_direct,
    mapping::{db_error_to_domain, event_log_to_domain},
};

#[async_trait]
impl BaseDbTrait for LedgerStateDb {
    async fn log_system_event(
        &self,
        run_id: Option<Uuid>,
        message: String,
        metadata: Option<serde_json::Value>,
        severity: EventSeverity,
    ) -> Result<(), Error> {
        log_event_direct(
            &self.conn,
            run_id,
            EventType::EngineEvent,
            severity,
            Some(message),
            metadata,
        )
        .await
    }

    async fn list_events(
        &self,
        run_id: Option<Uuid>,
        limit: u64,
    ) -> Result<Vec<EventLogRecord>, Error> {
        let mut query = event_log::Entity::find();

        if let Some(run_id) = run_id {
            query = query.filter(event_log::Column::RunId.eq(run_id));
        }

        let models = query
            .order_by_desc(event_log::Column::Timestamp)
            .limit(limit)
            .all(&self.conn)
            .await
            .map_err(db_error_to_domain)?;

        models.into_iter().map(event_log_to_domain).collect()
    }
}

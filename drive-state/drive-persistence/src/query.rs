use drive_common::{common::RunOrdering, run::RunFilter};
use sea_orm::{ColumnTrait, Condition, QueryOrder, QuerySelect, Select};

use crate::entities::drive_table;

/// Equality conditions of `filter`. The limit is applied by [`limited`].
pub(crate) fn filter_condition(filter: &RunFilter) -> Condition {
    Condition::all()
        .add_option(
            filter
                .pipeline_name
                .clone()
                .map(|name| drive_table::Column::PipelineName.eq(name)),
        )
        .add_option(
            filter
                .dag_run_id
                .clone()
                .map(|dag_run_id| drive_table::Column::DagRunId.eq(dag_run_id)),
        )
        .add_option(
            filter
                .pipeline_status
                .map(|status| drive_table::Column::PipelineStatus.eq(status.to_string())),
        )
        .add_option(
            filter
                .target_day
                .map(|day| drive_table::Column::TargetDay.eq(day)),
        )
        .add_option(
            filter
                .pipeline_id
                .map(|id| drive_table::Column::PipelineId.eq(id)),
        )
        .add_option(filter.source.clone().map(|source| {
            Condition::all()
                .add(drive_table::Column::SourceName.eq(source.name))
                .add(drive_table::Column::SourceCategory.eq(source.category))
                .add(drive_table::Column::SourceSubType.eq(source.sub_type))
        }))
}

pub(crate) fn ordered(
    query: Select<drive_table::Entity>,
    ordering: RunOrdering,
) -> Select<drive_table::Entity> {
    let query = match ordering {
        RunOrdering::Priority => query
            .order_by_asc(drive_table::Column::PipelinePriority)
            // unstarted runs last, whatever the backend's NULL ordering
            .order_by_asc(drive_table::Column::PipelineStartTime.is_null())
            .order_by_asc(drive_table::Column::PipelineStartTime),
        RunOrdering::WindowStart => query.order_by_asc(drive_table::Column::QueryWindowStartTime),
    };

    query
        .order_by_asc(drive_table::Column::RecordFirstInsertedTime)
        .order_by_asc(drive_table::Column::RunId)
}

pub(crate) fn limited(
    query: Select<drive_table::Entity>,
    limit: Option<u64>,
) -> Select<drive_table::Entity> {
    match limit {
        Some(limit) => query.limit(limit),
        None => query,
    }
}

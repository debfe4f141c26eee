pub mod drive_sync_days;
pub mod drive_table;
pub mod drive_table_history;
pub mod event_log;

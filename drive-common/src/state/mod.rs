mod alert;
mod base;
mod run;
mod sync;

pub use alert::AlertDbTrait;
pub use base::BaseDbTrait;
pub use run::RunDbTrait;
pub use sync::SyncDbTrait;

/// Combined trait for all database operations
/// (Ledger, Sync, Alerts)
/// Should be used through dyn dispatch at the top level
/// to pass the complete database interface
pub trait DatabaseTrait: RunDbTrait + SyncDbTrait + AlertDbTrait {}

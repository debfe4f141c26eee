mod error;
pub mod ledger;

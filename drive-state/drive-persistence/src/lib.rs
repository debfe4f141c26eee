pub mod db;
mod entities;
mod event_logging;
mod mapping;
mod query;
mod trait_impl;

pub use db::LedgerStateDb;

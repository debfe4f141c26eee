pub mod alert;
pub mod capabilities;
pub mod common;
pub mod duration;
pub mod error;
pub mod event;
pub mod run;
pub mod state;
pub mod sync;

mod drive_table;
mod event;
mod history;

pub use drive_table::*;
pub use event::*;
pub use history::*;

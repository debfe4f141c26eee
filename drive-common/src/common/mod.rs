mod ordering;

pub use ordering::RunOrdering;

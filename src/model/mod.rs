pub mod task;
pub mod tracker;

pub mod config;
pub mod data;
pub mod grid;
pub mod search;
pub mod source;
pub mod table_display;
pub mod utils;
pub mod viewport;

pub use grid::{HugeList, LifecycleEvent, RenderedWindow, RowEvent};

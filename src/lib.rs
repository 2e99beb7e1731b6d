pub mod command;
pub mod config;
pub mod dimension;
pub mod editor;
pub mod error;
pub mod math;
pub mod model;
pub mod operations;
pub mod repository;

pub use config::{HistoryConfig, JoinConfig};
pub use editor::FloorPlanEditor;
pub use error::{JoineryError, Result};
pub use repository::{ElementRepository, InMemoryRepository};

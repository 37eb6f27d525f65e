pub mod app;
pub mod catalog;
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod debounce;
pub mod dream;
pub mod highlight;
pub mod search;
pub mod storage;
pub mod timefmt;
pub mod ui;

pub use app::{ActionDispatcher, Outcome, ViewState};
pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use dream::DreamRecord;
pub use storage::{HistoryRepository, HistoryStore, MemoryHistory};

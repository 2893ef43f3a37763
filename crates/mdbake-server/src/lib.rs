//! File watching and live preview for mdbake.
//!
//! Re-renders changed Markdown sources and reloads connected browsers over a
//! websocket.

pub mod reload;
pub mod server;
pub mod watcher;

pub use reload::{ReloadHub, ReloadMessage};
pub use server::{PreviewConfig, PreviewServer, ServerError};
pub use watcher::{apply_watch_event, FileWatcher, WatchEvent};

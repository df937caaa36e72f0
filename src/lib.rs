// Export modules for use in tests
pub mod api;
pub mod app;
pub mod cli;
pub mod comments;
pub mod controller;
pub mod date;
pub mod document;
pub mod event_source;
pub mod export;
pub mod notification;
pub mod outline;
pub mod panic_handler;
pub mod settings;
pub mod text;
pub mod theme;
pub mod view;
pub mod widget;

pub mod test_utils;

// Re-export main app components
pub use app::{App, Focus, run_app_with_event_source};

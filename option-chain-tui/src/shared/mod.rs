/// Shared modules for the option chain dashboard
pub mod client;
pub mod controller;
pub mod error;
pub mod format;
pub mod refresh;
pub mod state;
pub mod types;
pub mod view;
pub mod widget;

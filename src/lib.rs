pub mod app;
pub mod catalog;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod navigator;
pub mod platform;
pub mod sanitize;
pub mod terminal;
pub mod ui;

pub use error::{LauncherError, Result};

//! Beatport API v4 metadata source for music autotaggers
pub mod config;
pub mod error;
pub mod models;
pub mod api;
pub mod source;
pub mod art;
pub mod util;

#![forbid(unsafe_code)]

//! `life-organizer`: a chat assistant that files free-form notes, photos,
//! documents and voice memos into a structured workspace.

pub mod app;
pub mod classifier;
pub mod clock;
pub mod config;
pub mod errors;
pub mod frontend;
pub mod gamification;
pub mod models;
pub mod persistence;
pub mod resolver;
pub mod session;
pub mod slack;
pub mod store;
pub mod util;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};

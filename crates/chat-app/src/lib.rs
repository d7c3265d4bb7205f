//! Terminal front-end for the chat session: command parsing, transcript rendering
//! and the stdin/stdout loop.

pub mod app;
pub mod command;
pub mod error;
pub mod presenter;
pub mod provider;
pub mod transcript;

pub use app::ChatApp;
pub use error::{AppError, AppResult};

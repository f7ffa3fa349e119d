//! Chat notifications for run outcomes.
//!
//! Delivery is fire-and-forget: every notifier method returns `()` and
//! swallows its own failures after logging them.

mod client;
mod config;

pub use client::{build_notifier, NoOpNotifier, Notifier, NotifierHandle, TelegramNotifier};
pub use config::TelegramConfig;

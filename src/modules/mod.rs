//! Modules layer - Clients for the external services the features call
//!
//! GitHub hosts the prompt repository; Telegram receives feedback and notices.

pub mod github;
pub mod telegram;

//! Notification channels.
//!
//! Each channel implements [`crate::core::Channel`] and owns one external
//! resource: the webhook channel a single HTTP request, the sound channel a
//! spawned OS process.
pub mod feishu;
pub mod sound;

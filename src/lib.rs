//! mosdns-lite: one-shot web installation wizard for a DNS forwarder.

pub mod config;
pub mod engine;
pub mod install;
pub mod lifecycle;
pub mod server;

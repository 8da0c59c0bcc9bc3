//! Stickerforge - video to animated WebP sticker service
//!
//! This library crate exposes the conversion service and HTTP server so the
//! binary and the integration tests share one implementation.

pub mod config;
pub mod params;
pub mod retention;
pub mod server;
pub mod service;
pub mod store;

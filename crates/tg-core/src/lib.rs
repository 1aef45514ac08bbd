//! tg-core: Core abstractions for tailgate
//!
//! This crate provides the shared data model (peers and directory
//! snapshots), the directory source abstraction and its `tailscale`
//! CLI implementation, overlay-interface resolution, and configuration
//! structures used by the guard daemon.

pub mod config;
pub mod error;
pub mod identity;
pub mod netif;
pub mod source;
pub mod tailscale;
pub mod types;

pub use error::{DirectoryError, IdentityError, TgError};
pub use source::DirectorySource;
pub use types::{DirectorySnapshot, Peer};

//! tg-guard: tailnet membership authorization for HTTP services
//!
//! The guard sits in front of an HTTP service and only forwards
//! requests whose transport-level remote address belongs to a known
//! tailnet member. The member directory is fetched through a
//! [`tg_core::DirectorySource`] and cached with a TTL so per-request
//! checks stay cheap.

pub mod cache;
pub mod gate;

pub use cache::DirectoryCache;
pub use gate::{protect, protect_with_ttl, require_member};

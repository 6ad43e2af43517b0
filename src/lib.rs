//! placement-explorer
//!
//! Point-in-time view of the resources OpenStack Placement tracks: per
//! provider inventories and usages, and what each instance has claimed.

pub mod config;
pub mod error;
pub mod openstack;
pub mod resource;
pub mod server;

/// Version injected at compile time via PLACEMENT_EXPLORER_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("PLACEMENT_EXPLORER_VERSION") {
    Some(v) => v,
    None => "dev",
};

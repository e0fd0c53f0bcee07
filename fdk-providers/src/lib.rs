//! Storage drivers for File Driver Kit
//!
//! Every driver exposes a `register` hook that adds its builder to a
//! [`DriverRegistry`] under a unique name.

mod local;
mod memory;

#[cfg(feature = "dropbox")]
pub mod dropbox;

pub use local::LocalDriver;
pub use memory::MemoryDriver;

#[cfg(feature = "dropbox")]
pub use dropbox::{DropboxConfig, DropboxDriver};

use fdk_core::DriverRegistry;

/// Register every driver compiled into this build.
pub fn register_all(registry: &DriverRegistry) {
    local::register(registry);
    memory::register(registry);

    #[cfg(feature = "dropbox")]
    dropbox::register(registry);
}

/// A registry holding every driver compiled into this build.
pub fn default_registry() -> DriverRegistry {
    let registry = DriverRegistry::new();
    register_all(&registry);
    registry
}

//! File Driver Kit Core
//!
//! The storage driver contract, the builder protocol and the registry that
//! selects a driver by name at runtime.

pub mod config;
pub mod driver;
pub mod error;
pub mod file;
pub mod path;
pub mod registry;

pub use config::DriverConfig;
pub use driver::{collect_bytes, once_stream, ByteStream, Driver};
pub use error::{FdkError, FdkResult};
pub use file::File;
pub use path::DriverPath;
pub use registry::{Builder, DriverRegistry};

pub mod codec;
pub mod commands;
pub mod connection;
pub mod frame;
pub mod server;
pub mod snapshot;
pub mod store;

/// Canonical snapshot filename, written to the current working directory.
pub const SNAPSHOT_FILE: &str = "dump.my_rdb";

/// Seconds between background snapshot writes.
pub const SNAPSHOT_INTERVAL_SECS: u64 = 300;

pub const DEFAULT_PORT: u16 = 6379;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Result<T> = std::result::Result<T, Error>;

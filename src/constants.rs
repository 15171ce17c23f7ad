//! # Constants
//!
//! Constants used throughout the application

/// Address the server binds to
pub const BIND_ADDR: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_PORT: u16 = 8888;

/// Default maximum number of simultaneous client connections
pub const MAX_CONNECTIONS: usize = 1024;

/// Size of the per-read chunk pulled off a socket
pub const READ_BUFFER_LEN: usize = 1024;

/// Cap on a connection's input buffer, matching the RESP bulk-string ceiling
/// of 512 MiB. A connection that exceeds it is closed.
pub const MAX_INPUT_BUFFER_LEN: usize = 512 * 1024 * 1024;

/// Period of the active-eviction reaper, in milliseconds
pub const REAPER_TICK_MS: u64 = 100;

/// Number of keys the reaper samples from the expiry table per tick.
/// A fixed constant, so reaper work per tick is bounded regardless of
/// keyspace size.
pub const REAPER_SAMPLE_SIZE: usize = 10;

//! # Types
//!
//! Type aliases used throughout the application
//!
//! The keyspace is split in two: one map from keys to values, and a side
//! table from keys to expiration deadlines, populated only for keys that
//! actually carry a TTL. Keys without a TTL live forever and cost nothing
//! in the side table.

use crate::storage::Store;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Primary key
pub type StorageKey = String;

/// A stored string payload (UTF-8, decoded from RESP bulk strings)
pub type StorageValue = String;

/// Absolute monotonic-clock instant at which a key becomes eligible for
/// eviction
pub type Deadline = Instant;

/// The process-wide keyspace, shared between connection tasks and the
/// expiry reaper. A coarse mutex keeps each command atomic with respect to
/// other commands and to reaper ticks.
pub type SharedStore = Arc<Mutex<Store>>;

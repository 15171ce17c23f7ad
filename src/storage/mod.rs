//! # Storage
//!
//! The typed in-memory keyspace and its expiry side table

pub mod store;
pub mod value;

pub use store::Store;
pub use value::Value;

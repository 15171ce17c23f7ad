//! Stored value representation

use crate::types::StorageValue;
use std::collections::VecDeque;

/// A stored value: a closed sum over the two supported shapes.
///
/// A key's tag is fixed the moment the key is created. A list operation
/// against a string-valued key (or the reverse) is a type error and must not
/// mutate anything; only an explicit overwrite via `SET` or a delete can
/// change what a key holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A plain UTF-8 string payload
    String(StorageValue),
    /// A double-ended sequence of payloads, ordered head to tail
    List(VecDeque<StorageValue>),
}

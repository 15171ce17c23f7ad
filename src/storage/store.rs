//! The keyspace: a typed map of keys to values plus an expiry side table.
//!
//! Every operation is O(1) expected, except [`Store::sample_expired`] which
//! is O(sample size). The side table only ever holds keys that also exist in
//! the data map; [`Store::del`] and the eviction paths remove from both, so
//! the invariant survives every mutation.

use crate::errors::WrongTypeError;
use crate::storage::Value;
use crate::types::{Deadline, StorageKey, StorageValue};
use log::debug;
use rand::seq::IteratorRandom;
use std::collections::{HashMap, VecDeque};
use std::time::Instant;

/// The in-memory keyspace
#[derive(Debug, Default)]
pub struct Store {
    data: HashMap<StorageKey, Value>,
    expiry: HashMap<StorageKey, Deadline>,
}

impl Store {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a string value at `key`, overwriting any prior value of
    /// either shape. Does not touch the expiry table.
    pub fn set_string(&mut self, key: &str, value: &str) {
        self.data
            .insert(key.to_string(), Value::String(value.to_string()));
    }

    /// Records an eviction deadline for `key`, overwriting any previous one.
    pub fn set_expiry(&mut self, key: &str, deadline: Deadline) {
        self.expiry.insert(key.to_string(), deadline);
    }

    /// Removes any eviction deadline for `key`. No-op if none is set.
    pub fn clear_expiry(&mut self, key: &str) {
        self.expiry.remove(key);
    }

    /// Returns the stored string iff `key` holds one.
    ///
    /// Missing keys and list-valued keys both yield `None`; callers reply
    /// with the null bulk string in either case rather than a type error.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.data.get(key) {
            Some(Value::String(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Removes `key` from the keyspace and the expiry table.
    ///
    /// Returns whether the key existed.
    pub fn del(&mut self, key: &str) -> bool {
        self.expiry.remove(key);
        self.data.remove(key).is_some()
    }

    /// Prepends `items` at the head of the list at `key`, one at a time in
    /// argument order, creating the list if the key is absent. The last item
    /// pushed ends up at the head.
    ///
    /// Returns the new list length, or [`WrongTypeError`] if `key` holds a
    /// string; nothing is mutated in that case.
    pub fn lpush(&mut self, key: &str, items: &[StorageValue]) -> Result<usize, WrongTypeError> {
        match self.data.get_mut(key) {
            Some(Value::List(list)) => {
                for item in items {
                    list.push_front(item.clone());
                }
                Ok(list.len())
            }
            Some(Value::String(_)) => Err(WrongTypeError),
            None => {
                let mut list = VecDeque::with_capacity(items.len());
                for item in items {
                    list.push_front(item.clone());
                }
                let len = list.len();
                self.data.insert(key.to_string(), Value::List(list));
                Ok(len)
            }
        }
    }

    /// Removes and returns the head of the list at `key`.
    ///
    /// An absent key or an empty list yields `Ok(None)`; a string-valued key
    /// yields [`WrongTypeError`].
    pub fn lpop(&mut self, key: &str) -> Result<Option<StorageValue>, WrongTypeError> {
        match self.data.get_mut(key) {
            Some(Value::List(list)) => Ok(list.pop_front()),
            Some(Value::String(_)) => Err(WrongTypeError),
            None => Ok(None),
        }
    }

    /// Passive eviction: if `key` carries a deadline that `now` has passed,
    /// removes it from both maps before any read can observe it.
    ///
    /// Returns whether the key was evicted.
    pub fn evict_if_expired(&mut self, key: &str, now: Instant) -> bool {
        match self.expiry.get(key) {
            Some(deadline) if now > *deadline => {
                self.expiry.remove(key);
                self.data.remove(key);
                debug!("passive eviction: removed expired key `{key}`");
                true
            }
            _ => false,
        }
    }

    /// Uniformly samples up to `n` distinct keys from the expiry table
    /// (without replacement) and returns those whose deadline is strictly
    /// before `now`.
    ///
    /// Keys whose deadline is still ahead are never returned, so the reaper
    /// cannot evict a live key.
    pub fn sample_expired(&self, n: usize, now: Instant) -> Vec<StorageKey> {
        let mut rng = rand::thread_rng();
        self.expiry
            .iter()
            .choose_multiple(&mut rng, n)
            .into_iter()
            .filter(|(_, deadline)| **deadline < now)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Number of keys in the keyspace.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the keyspace holds no keys at all.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of keys carrying an eviction deadline.
    pub fn expiry_len(&self) -> usize {
        self.expiry.len()
    }
}

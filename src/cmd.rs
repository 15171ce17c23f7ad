//! # Command Dispatcher
//!
//! Consumes one decoded command frame, runs it against the keyspace, and
//! produces the reply bytes. Command names are matched case-insensitively;
//! arguments are passed through verbatim.
//!
//! Every command validates its arity and options before touching the store,
//! so a rejected command never mutates anything. Errors never escape this
//! module: whatever goes wrong becomes a RESP error reply.
//!
//! [Commands](https://redis.io/docs/latest/commands/)

use crate::resp::{self, Frame};
use crate::storage::Store;
use crate::types::SharedStore;
use bytes::Bytes;
use std::time::{Duration, Instant};

/// Runs one command frame and returns the reply bytes.
///
/// Takes the keyspace lock once for the whole command, which keeps each
/// command atomic with respect to other connections and the expiry reaper.
pub fn dispatch(storage: &SharedStore, frame: Frame) -> Bytes {
    let parts = match frame {
        Frame::Array(parts) => parts,
        // A server-mode parser only ever yields arrays.
        _ => return resp::encode_simple_error("unsupported request type"),
    };
    let Some((name, args)) = parts.split_first() else {
        return resp::encode_simple_error("empty command");
    };

    let mut store = storage.lock().expect("keyspace mutex");
    match name.to_ascii_uppercase().as_str() {
        "PING" => handle_ping(args),
        "ECHO" => handle_echo(args),
        "SET" => handle_set(&mut store, args),
        "GET" => handle_get(&mut store, args),
        "DEL" => handle_del(&mut store, args),
        "LPUSH" => handle_lpush(&mut store, args),
        "LPOP" => handle_lpop(&mut store, args),
        other => resp::encode_simple_error(&format!("unknown command '{other}'")),
    }
}

fn arity_error(cmd: &str) -> Bytes {
    resp::encode_simple_error(&format!("wrong number of arguments for '{cmd}' command"))
}

/// `PING [message]`
///
/// Without an argument replies `+PONG`; with one argument echoes it back as
/// a bulk string.
fn handle_ping(args: &[String]) -> Bytes {
    match args {
        [] => resp::encode_simple_string("PONG"),
        [message] => resp::encode_bulk_string(Some(message)),
        _ => arity_error("ping"),
    }
}

/// `ECHO message`
fn handle_echo(args: &[String]) -> Bytes {
    match args {
        [message] => resp::encode_bulk_string(Some(message)),
        _ => arity_error("echo"),
    }
}

/// `SET key value [EX seconds | PX millis]`
///
/// The bare two-argument form leaves any previously recorded TTL in place.
/// `EX 0` records a deadline of "now", so the key reads as expired from the
/// very next access onward.
fn handle_set(store: &mut Store, args: &[String]) -> Bytes {
    match args {
        [key, value] => {
            store.set_string(key, value);
            resp::encode_simple_string("OK")
        }
        [key, value, option, raw] => {
            let Some(ttl) = parse_expiry_option(option, raw) else {
                return resp::encode_simple_error("Incorrect args");
            };
            let Some(deadline) = Instant::now().checked_add(ttl) else {
                return resp::encode_simple_error("Incorrect args");
            };
            store.set_string(key, value);
            store.set_expiry(key, deadline);
            resp::encode_simple_string("OK")
        }
        _ => arity_error("set"),
    }
}

/// Decodes the `EX <seconds>` / `PX <millis>` option pair into a TTL.
///
/// The keyword is case-insensitive; the value must be a plain run of
/// decimal digits.
fn parse_expiry_option(option: &str, raw: &str) -> Option<Duration> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value = raw.parse::<u64>().ok()?;
    match option.to_ascii_uppercase().as_str() {
        "EX" => Some(Duration::from_secs(value)),
        "PX" => Some(Duration::from_millis(value)),
        _ => None,
    }
}

/// `GET key`
///
/// Checks the key's deadline before reading: an expired key is evicted from
/// both maps and reported as the null bulk string. A list-valued key also
/// replies null rather than a type error.
fn handle_get(store: &mut Store, args: &[String]) -> Bytes {
    match args {
        [key] => {
            if store.evict_if_expired(key, Instant::now()) {
                return resp::encode_bulk_string(None);
            }
            resp::encode_bulk_string(store.get_string(key))
        }
        _ => arity_error("get"),
    }
}

/// `DEL key [key …]`
///
/// Replies with the number of keys that existed and were removed.
fn handle_del(store: &mut Store, args: &[String]) -> Bytes {
    if args.is_empty() {
        return arity_error("del");
    }
    let removed = args.iter().filter(|key| store.del(key)).count();
    resp::encode_integer(removed as i64)
}

/// `LPUSH key value [value …]`
///
/// Replies with the new list length, or `wrong type` against a string key.
fn handle_lpush(store: &mut Store, args: &[String]) -> Bytes {
    let [key, items @ ..] = args else {
        return arity_error("lpush");
    };
    if items.is_empty() {
        return arity_error("lpush");
    }
    match store.lpush(key, items) {
        Ok(len) => resp::encode_integer(len as i64),
        Err(_) => resp::encode_simple_error("wrong type"),
    }
}

/// `LPOP key`
///
/// The popped element comes back as a simple string, and a missing (or
/// drained) key is reported as `wrong key` rather than a null bulk; both
/// quirks are load-bearing for existing clients.
fn handle_lpop(store: &mut Store, args: &[String]) -> Bytes {
    match args {
        [key] => match store.lpop(key) {
            Ok(Some(head)) => resp::encode_simple_string(&head),
            Ok(None) => resp::encode_simple_error("wrong key"),
            Err(_) => resp::encode_simple_error("wrong type"),
        },
        _ => arity_error("lpop"),
    }
}

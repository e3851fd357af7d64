//! Lifecycle trace records.
//!
//! A registry may carry one [`TraceHook`]. Every scene it creates shares the
//! hook and reports its lifecycle through it. Records are a one-byte id plus
//! a small payload: the little-endian frame counter followed by the scene
//! name. Hook failures are ignored; tracing never affects scheduling.

use crate::error::TraceError;
use crate::sync::Arc;

pub type TraceResult = Result<(), TraceError>;

/// Callback receiving `(record, payload, with_timestamp)`.
pub type TraceHook = Arc<dyn Fn(u8, &[u8], bool) -> TraceResult + Send + Sync>;

/// Scene registered and `begin` delivered.
pub const SCENE_ADD: u8 = 70;
/// `enter` delivered.
pub const SCENE_ENTER: u8 = 71;
/// `update` delivered.
pub const SCENE_UPDATE: u8 = 72;
/// `exit` delivered.
pub const SCENE_EXIT: u8 = 73;
/// Counter reset and `reset` delivered.
pub const SCENE_RESET: u8 = 74;
/// Scene removed from the registry.
pub const SCENE_ERASE: u8 = 75;
/// A registry poll dispatched nothing.
pub const SCENE_IDLE: u8 = 76;

/// Longest name slice copied into a record.
pub const MAX_NAME_LEN: usize = 32;

/// Returns a printable label for a record id.
pub fn record_name(record: u8) -> &'static str {
    match record {
        SCENE_ADD => "add",
        SCENE_ENTER => "enter",
        SCENE_UPDATE => "update",
        SCENE_EXIT => "exit",
        SCENE_RESET => "reset",
        SCENE_ERASE => "erase",
        SCENE_IDLE => "idle",
        _ => "unknown",
    }
}

/// Accepts only lifecycle records whose payload fits an encoded record.
///
/// Trace backends call this before writing a record out.
pub fn check(record: u8, payload: &[u8]) -> TraceResult {
    if !(SCENE_ADD..=SCENE_IDLE).contains(&record) {
        return Err(TraceError::Rejected(record));
    }
    if payload.len() > 8 + MAX_NAME_LEN {
        return Err(TraceError::PayloadTooLarge(payload.len()));
    }
    Ok(())
}

/// Sends one record built on the stack.
pub(crate) fn emit(hook: Option<&TraceHook>, record: u8, frame: u64, name: &str) {
    if let Some(hook) = hook {
        let mut buf = [0u8; 8 + MAX_NAME_LEN];
        let len = encode(&mut buf, frame, name);
        let _ = hook(record, &buf[..len], true);
    }
}

/// Writes `frame` then up to [`MAX_NAME_LEN`] name bytes, cut on a char
/// boundary, returning the length.
pub fn encode(buf: &mut [u8; 8 + MAX_NAME_LEN], frame: u64, name: &str) -> usize {
    buf[..8].copy_from_slice(&frame.to_le_bytes());
    let mut n = name.len().min(MAX_NAME_LEN);
    while !name.is_char_boundary(n) {
        n -= 1;
    }
    buf[8..8 + n].copy_from_slice(&name.as_bytes()[..n]);
    8 + n
}

/// Splits a record payload back into `(frame, name)`.
pub fn decode(payload: &[u8]) -> Option<(u64, &str)> {
    let head: [u8; 8] = payload.get(..8)?.try_into().ok()?;
    let name = core::str::from_utf8(&payload[8..]).ok()?;
    Some((u64::from_le_bytes(head), name))
}

//! Dotted key-path resolution.
//!
//! A key path such as `Foo.2.Bar` is consumed one segment at a time. Object
//! segments match property names case-insensitively; array segments must be
//! plain decimal indices. Only scalar leaves are returned: a path ending on a
//! container resolves to nothing, and segments left over after reaching a
//! scalar are ignored.

use serde_json::{Map, Value};

use crate::errors::PathError;

/// Path segment separator.
pub const SEPARATOR: char = '.';

/// Walk `node` along `path` and return the addressed target.
///
/// `Ok(None)` means a property along the way does not exist, which callers
/// treat as a silent skip. Malformed or out-of-range array indices are
/// errors.
pub fn resolve<'a>(node: &'a mut Value, path: &str) -> Result<Option<&'a mut Value>, PathError> {
    match node {
        Value::Object(map) => {
            let (segment, rest) = split_segment(path);
            match find_property(map, segment) {
                Some(child) => descend(child, rest),
                None => Ok(None),
            }
        }
        Value::Array(items) => index_array(items, path),
        _ => Ok(None),
    }
}

fn descend<'a>(child: &'a mut Value, rest: &str) -> Result<Option<&'a mut Value>, PathError> {
    match child {
        Value::Object(_) | Value::Array(_) if rest.is_empty() => Ok(None),
        Value::Object(_) => resolve(child, rest),
        Value::Array(items) => index_array(items, rest),
        _ => Ok(Some(child)),
    }
}

fn index_array<'a>(items: &'a mut [Value], path: &str) -> Result<Option<&'a mut Value>, PathError> {
    let (segment, rest) = split_segment(path);
    let index = parse_index(segment)?;
    let len = items.len();
    let element = items
        .get_mut(index)
        .ok_or(PathError::IndexOutOfRange { index, len })?;

    descend(element, rest)
}

/// Exact property name first, then the first case-insensitive match in
/// document order.
fn find_property<'a>(map: &'a mut Map<String, Value>, name: &str) -> Option<&'a mut Value> {
    if map.contains_key(name) {
        return map.get_mut(name);
    }
    let wanted = name.to_lowercase();
    let key = map.keys().find(|k| k.to_lowercase() == wanted)?.clone();
    map.get_mut(&key)
}

fn split_segment(path: &str) -> (&str, &str) {
    path.split_once(SEPARATOR).unwrap_or((path, ""))
}

/// Strict base-10 index: ASCII digits only, no sign or whitespace.
fn parse_index(segment: &str) -> Result<usize, PathError> {
    let invalid = || PathError::InvalidIndex {
        segment: segment.to_string(),
    };
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    segment.parse().map_err(|_| invalid())
}

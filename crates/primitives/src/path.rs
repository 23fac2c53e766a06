//! Store key conventions for collections
//!
//! ```text
//! <prefix><key>                                     primary record
//! <prefix-no-sep>__index_<name>/<value>/<key>       index back-reference (value = <key>)
//! ```
//!
//! Keys and index values are used verbatim: a key or value containing the
//! separator or the `__index_` marker can collide with another path.

use strata_core::SEPARATOR;

/// Marker between a collection's prefix and an index name
pub const INDEX_MARKER: &str = "__index_";

/// Ensure a prefix ends with the separator
///
/// Listing `foo` must never match keys under `foobar`. The empty prefix
/// becomes the bare separator, keeping records apart from the index
/// directories that sit at the root.
pub fn normalize_prefix(prefix: &str) -> String {
    if prefix.ends_with(SEPARATOR) {
        prefix.to_string()
    } else {
        format!("{prefix}{SEPARATOR}")
    }
}

/// Primary path of `key`
pub fn primary_path(prefix: &str, key: &str) -> String {
    format!("{prefix}{key}")
}

/// Directory holding every entry of one index, separator-terminated
pub fn index_root(prefix: &str, index: &str) -> String {
    format!(
        "{}{INDEX_MARKER}{index}{SEPARATOR}",
        prefix.trim_end_matches(SEPARATOR)
    )
}

/// Directory holding the entries of one index value
pub fn index_dir(prefix: &str, index: &str, value: &str) -> String {
    format!("{}{value}", index_root(prefix, index))
}

/// Path of the back-reference for `key` under one index value
pub fn index_path(prefix: &str, index: &str, value: &str, key: &str) -> String {
    format!("{}{SEPARATOR}{key}", index_dir(prefix, index, value))
}

/// Strip `dir` from a full store key, yielding the collection-relative key
///
/// Keys outside `dir` are returned whole.
pub fn relative_key<'a>(full: &'a str, dir: &str) -> &'a str {
    full.strip_prefix(dir).unwrap_or(full)
}

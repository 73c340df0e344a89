//! Canonical snapshot timestamp codec.
//!
//! Snapshot filenames embed their capture time as `yyyyMMdd_HHmmss` in
//! local time, second precision. The first 15 characters of a snapshot's
//! base name must parse against this pattern; names that don't are dated
//! by file creation time instead. The two decoder stages are separate
//! functions so each is observable on its own.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use std::fs::Metadata;

/// strftime pattern for the canonical stamp.
pub const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Length of a canonical stamp string.
pub const STAMP_LEN: usize = 15;

/// Format a timestamp as a canonical stamp.
pub fn format(timestamp: DateTime<Local>) -> String {
    timestamp.format(STAMP_FORMAT).to_string()
}

/// Strictly parse the leading stamp of a snapshot base name.
///
/// Returns `None` unless the first [`STAMP_LEN`] characters match the
/// canonical pattern exactly.
pub fn parse(base_name: &str) -> Option<DateTime<Local>> {
    let head = base_name.get(..STAMP_LEN)?;
    let naive = NaiveDateTime::parse_from_str(head, STAMP_FORMAT).ok()?;
    // An ambiguous wall-clock time (DST fold) resolves to the earlier
    // instant; a nonexistent one yields None and the caller falls back.
    Local.from_local_datetime(&naive).earliest()
}

/// Fallback stamp source: the file's creation time.
///
/// Filesystems without birth-time support report modification time.
pub fn from_metadata(meta: &Metadata) -> Option<DateTime<Local>> {
    meta.created()
        .or_else(|_| meta.modified())
        .ok()
        .map(DateTime::<Local>::from)
}

//! Read-time lifecycle of listings.
//!
//! A hot listing stops being active the moment the wall clock passes its
//! `expires_at`. Nothing is written back when that happens: every reader
//! recomputes it from `(expires_at, now)`.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use crate::models::{Listing, ListingKind, ListingStatus};

pub const UNSPECIFIED: &str = "unspecified";
pub const EXPIRED: &str = "expired";

/// Shortest and longest lifetime a hot listing may be created with.
pub const MIN_HOT_MINUTES: i64 = 1;
pub const MAX_HOT_MINUTES: i64 = 24 * 60;

/// Parses a stored timestamp. Accepts RFC 3339 as well as the
/// `YYYY-MM-DD HH:MM:SS[.f][+zz]` text Postgres emits; anything else is
/// `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%d %H:%M:%S%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|n| n.and_utc())
}

/// Expiry of a listing, `None` when absent or unparseable.
pub fn expiry(listing: &Listing) -> Option<DateTime<Utc>> {
    listing.expires_at.as_deref().and_then(parse_timestamp)
}

/// Time-based activity only; `status` is not consulted.
pub fn is_active(listing: &Listing, now: DateTime<Utc>) -> bool {
    match listing.kind {
        ListingKind::Regular => true,
        ListingKind::Hot => expiry(listing).is_some_and(|exp| exp > now),
    }
}

/// Whether a listing may currently be shown to buyers: moderated into
/// `active` and not past its expiry.
pub fn is_visible(listing: &Listing, now: DateTime<Utc>) -> bool {
    listing.status == ListingStatus::Active && is_active(listing, now)
}

/// The value stored as `expires_at` for a hot listing created at `now`.
pub fn expiry_after(now: DateTime<Utc>, minutes: i64) -> String {
    (now + Duration::minutes(minutes)).to_rfc3339()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    Unspecified,
    Expired,
    Left { days: i64, hours: i64, minutes: i64 },
}

/// Time left until `expires_at`, floored to the minute.
pub fn remaining(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Remaining {
    let Some(exp) = expires_at else { return Remaining::Unspecified };
    if now >= exp {
        return Remaining::Expired;
    }
    let total = (exp - now).num_minutes();
    Remaining::Left {
        days: total / (24 * 60),
        hours: total / 60 % 24,
        minutes: total % 60,
    }
}

/// Same as [`remaining`] for the raw stored text.
pub fn remaining_raw(expires_at: Option<&str>, now: DateTime<Utc>) -> Remaining {
    remaining(expires_at.and_then(parse_timestamp), now)
}

fn unit(n: i64, one: &str, many: &str) -> String {
    format!("{n} {}", if n == 1 { one } else { many })
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Remaining::Unspecified => f.write_str(UNSPECIFIED),
            Remaining::Expired => f.write_str(EXPIRED),
            Remaining::Left { days, hours, minutes } => write!(
                f,
                "{} {} {}",
                unit(days, "day", "days"),
                unit(hours, "hour", "hours"),
                unit(minutes, "minute", "minutes")
            ),
        }
    }
}

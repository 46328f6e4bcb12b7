// cloudsql-restore-resource/src/model/time.rs
use chrono::{DateTime, FixedOffset, Offset, SecondsFormat, Utc};

/// Asia/Taipei has observed a constant UTC+08:00 with no DST since 1979.
const DISPLAY_UTC_OFFSET_SECS: i32 = 8 * 3600;

pub fn display_zone() -> FixedOffset {
    match FixedOffset::east_opt(DISPLAY_UTC_OFFSET_SECS) {
        Some(zone) => zone,
        None => Utc.fix(),
    }
}

pub fn to_display_zone(ts: DateTime<Utc>) -> DateTime<FixedOffset> {
    ts.with_timezone(&display_zone())
}

/// RFC 3339 with whole seconds and a numeric offset, or "" when absent.
pub fn format_display_time(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| to_display_zone(t).to_rfc3339_opts(SecondsFormat::Secs, false))
        .unwrap_or_default()
}

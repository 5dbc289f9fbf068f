use ::time::{format_description::well_known, OffsetDateTime};

/// RFC 3339 timestamp in local time, UTC when the offset can't be determined.
pub fn now_rfc3339() -> String {
    now()
        .format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}

/// `HH:MM:SS` prefix used on log lines.
pub fn log_stamp() -> String {
    let t = now();
    format!("{:02}:{:02}:{:02}", t.hour(), t.minute(), t.second())
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

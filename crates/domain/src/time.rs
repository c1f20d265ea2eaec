use chrono::{DateTime, SubsecRound, Utc};

/// Current time truncated to microseconds, the resolution of `TIMESTAMPTZ`.
///
/// Rows read back from the database compare equal to the values that were
/// written.
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

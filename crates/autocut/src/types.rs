//! Shared value types for the autocut domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants (thresholds are non-negative, issue
//! states are one of two tags) and participate in the classification.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::duration::{self, ParseDurationError};
use crate::{IssueId, IssueNumber, Label};

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly; the underlying representation can change without affecting the
/// domain API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }

    /// Returns how long after `earlier` this timestamp is.
    ///
    /// Negative when `earlier` is actually later (clock skew between this
    /// host and the tracker).
    pub fn elapsed_since(self, earlier: Timestamp) -> ElapsedAge {
        ElapsedAge(self.0.signed_duration_since(earlier.0))
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

// ---------------------------------------------------------------------------
// Durations
// ---------------------------------------------------------------------------

/// Caller-configured duration separating "recent" from "stale" activity on a
/// matched issue.
///
/// Always non-negative and finite. Parsed from and rendered as strings such
/// as `"1h30m"` or `"90s"`; the same string form is used in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AgeThreshold(Duration);

impl AgeThreshold {
    /// Creates a threshold from a [`std::time::Duration`].
    pub fn from_std(duration: Duration) -> Self {
        Self(duration)
    }

    /// Returns the threshold as a [`std::time::Duration`].
    pub fn as_std(self) -> Duration {
        self.0
    }

    /// Returns `true` if an issue last touched `age` ago is at or beyond the
    /// threshold.
    ///
    /// Thresholds too large to express as a signed delta are never exceeded.
    pub fn is_exceeded_by(self, age: ElapsedAge) -> bool {
        match TimeDelta::from_std(self.0) {
            Ok(limit) => age.0 >= limit,
            Err(_) => false,
        }
    }
}

impl FromStr for AgeThreshold {
    type Err = ParseDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        duration::parse(s).map(Self)
    }
}

impl TryFrom<String> for AgeThreshold {
    type Error = ParseDurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AgeThreshold> for String {
    fn from(value: AgeThreshold) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for AgeThreshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&duration::format(false, self.0))
    }
}

// ---------------------------------------------------------------------------

/// Wall-clock time elapsed since an issue was last updated, measured at the
/// instant of classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElapsedAge(TimeDelta);

impl ElapsedAge {
    /// Wraps a signed [`TimeDelta`].
    pub fn new(delta: TimeDelta) -> Self {
        Self(delta)
    }

    /// Returns the underlying signed delta.
    pub fn as_delta(self) -> TimeDelta {
        self.0
    }
}

impl std::fmt::Display for ElapsedAge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let negative = self.0 < TimeDelta::zero();
        let magnitude = self.0.abs().to_std().unwrap_or(Duration::MAX);
        f.write_str(&duration::format(negative, magnitude))
    }
}

// ---------------------------------------------------------------------------
// Issues
// ---------------------------------------------------------------------------

/// Lifecycle state of a tracked issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    /// Returns the wire name of the state (`"open"` / `"closed"`).
    pub fn as_str(self) -> &'static str {
        match self {
            IssueState::Open => "open",
            IssueState::Closed => "closed",
        }
    }
}

impl std::fmt::Display for IssueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------

/// An issue as reported by the tracker.
///
/// Owned and mutated exclusively by the tracker; the domain only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedIssue {
    /// Tracker-global id (used when attaching the issue to a project column).
    pub id: IssueId,

    /// Repository-scoped number (used for comments and state edits).
    pub number: IssueNumber,

    /// Browser URL of the issue; reported back to the caller.
    pub url: String,

    /// Issue title. Matched against the event title with exact equality.
    pub title: String,

    /// Open or closed.
    pub state: IssueState,

    /// Last time anything changed on the issue (comment, edit, state change).
    pub updated_at: Timestamp,

    /// Labels currently on the issue.
    pub labels: Vec<Label>,
}

// ---------------------------------------------------------------------------

/// Payload for filing a brand-new issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    pub labels: Vec<Label>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_round_trips_through_its_string_form() {
        let threshold: AgeThreshold = "1h30m".parse().unwrap();
        assert_eq!(threshold.as_std(), Duration::from_secs(5400));
        assert_eq!(threshold.to_string(), "1h30m0s");

        let json = serde_json::to_string(&threshold).unwrap();
        assert_eq!(json, "\"1h30m0s\"");
        let back: AgeThreshold = serde_json::from_str(&json).unwrap();
        assert_eq!(back, threshold);
    }

    #[test]
    fn threshold_rejects_negative_values_when_deserialized() {
        assert!(serde_json::from_str::<AgeThreshold>("\"-1h\"").is_err());
    }

    #[test]
    fn threshold_is_exceeded_at_exactly_the_limit() {
        let threshold = AgeThreshold::from_std(Duration::from_secs(3600));
        assert!(!threshold.is_exceeded_by(ElapsedAge::new(TimeDelta::minutes(59))));
        assert!(threshold.is_exceeded_by(ElapsedAge::new(TimeDelta::minutes(60))));
        assert!(threshold.is_exceeded_by(ElapsedAge::new(TimeDelta::hours(2))));
    }

    #[test]
    fn negative_age_never_exceeds_a_threshold() {
        let threshold = AgeThreshold::from_std(Duration::ZERO);
        assert!(!threshold.is_exceeded_by(ElapsedAge::new(TimeDelta::seconds(-5))));
        assert!(threshold.is_exceeded_by(ElapsedAge::new(TimeDelta::zero())));
    }

    #[test]
    fn huge_threshold_is_never_exceeded() {
        let threshold = AgeThreshold::from_std(Duration::MAX);
        assert!(!threshold.is_exceeded_by(ElapsedAge::new(TimeDelta::days(365 * 100))));
    }

    #[test]
    fn elapsed_age_renders_sign_and_fraction() {
        assert_eq!(ElapsedAge::new(TimeDelta::minutes(90)).to_string(), "1h30m0s");
        assert_eq!(ElapsedAge::new(TimeDelta::seconds(-5)).to_string(), "-5s");
        assert_eq!(ElapsedAge::new(TimeDelta::milliseconds(2500)).to_string(), "2.5s");
    }

    #[test]
    fn elapsed_since_is_signed() {
        let earlier = Timestamp::from_utc(Utc::now());
        let later = Timestamp::from_utc(earlier.as_datetime() + TimeDelta::hours(2));
        assert_eq!(later.elapsed_since(earlier).as_delta(), TimeDelta::hours(2));
        assert_eq!(earlier.elapsed_since(later).as_delta(), TimeDelta::hours(-2));
    }

    #[test]
    fn issue_state_uses_lowercase_wire_names() {
        assert_eq!(serde_json::to_string(&IssueState::Closed).unwrap(), "\"closed\"");
        assert_eq!(IssueState::Open.to_string(), "open");
    }
}

//! Classification of prior issues against an incoming event title.
//!
//! Assuming a threshold of one day:
//!
//! - an open issue with this title updated within the day is left alone;
//! - an open issue with this title untouched for a day or more gets a comment;
//! - a closed issue with this title updated within the day is reopened;
//! - a closed issue with this title untouched for a day or more is treated as
//!   if it did not exist, and a fresh issue is filed.
//!
//! Only the first issue with an exactly equal title is ever considered, in the
//! order the tracker returned them.

use futures::TryStreamExt;

use crate::tracker::IssueStream;
use crate::{AgeThreshold, ElapsedAge, IssueState, Timestamp, TrackedIssue, TrackerError};

/// A title-matched issue together with its age at classification time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedIssue {
    pub issue: TrackedIssue,
    pub age: ElapsedAge,
}

/// Outcome of matching an event title against the tracker's issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Open and updated within the threshold.
    RecentOpen(MatchedIssue),
    /// Open but not updated within the threshold.
    StaleOpen(MatchedIssue),
    /// Closed and updated within the threshold.
    RecentClosed(MatchedIssue),
    /// Nothing usable: no title match, or only a long-closed one.
    NoMatch,
}

impl Classification {
    /// Returns the matched issue, if any.
    pub fn matched(&self) -> Option<&MatchedIssue> {
        match self {
            Classification::RecentOpen(m)
            | Classification::StaleOpen(m)
            | Classification::RecentClosed(m) => Some(m),
            Classification::NoMatch => None,
        }
    }

    /// Short label used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::RecentOpen(_) => "recent_open",
            Classification::StaleOpen(_) => "stale_open",
            Classification::RecentClosed(_) => "recent_closed",
            Classification::NoMatch => "no_match",
        }
    }
}

/// Pure classifier parameterised by the age threshold.
#[derive(Debug, Clone, Copy)]
pub struct Matcher {
    threshold: AgeThreshold,
}

impl Matcher {
    pub fn new(threshold: AgeThreshold) -> Self {
        Self { threshold }
    }

    /// Classifies an in-memory issue sequence.
    pub fn classify<I>(&self, issues: I, title: &str, now: Timestamp) -> Classification
    where
        I: IntoIterator<Item = TrackedIssue>,
    {
        issues
            .into_iter()
            .find(|issue| issue.title == title)
            .map_or(Classification::NoMatch, |issue| self.classify_match(issue, now))
    }

    /// Classifies a lazily fetched issue sequence.
    ///
    /// Stops pulling from `issues` at the first title match, so later pages are
    /// never requested. Any error yielded before that point is returned as is.
    pub async fn classify_stream(
        &self,
        mut issues: IssueStream<'_>,
        title: &str,
        now: Timestamp,
    ) -> Result<Classification, TrackerError> {
        while let Some(issue) = issues.try_next().await? {
            if issue.title == title {
                return Ok(self.classify_match(issue, now));
            }
        }
        Ok(Classification::NoMatch)
    }

    fn classify_match(&self, issue: TrackedIssue, now: Timestamp) -> Classification {
        let age = now.elapsed_since(issue.updated_at);
        let stale = self.threshold.is_exceeded_by(age);

        tracing::debug!(
            issue = %issue.number,
            state = %issue.state,
            age = %age,
            threshold = %self.threshold,
            stale,
            "found issue with matching title"
        );

        let matched = MatchedIssue { issue, age };
        match (matched.issue.state, stale) {
            (IssueState::Open, false) => Classification::RecentOpen(matched),
            (IssueState::Open, true) => Classification::StaleOpen(matched),
            (IssueState::Closed, false) => Classification::RecentClosed(matched),
            (IssueState::Closed, true) => {
                tracing::debug!(
                    issue = %matched.issue.number,
                    "matching issue closed too long ago; treating as no match"
                );
                Classification::NoMatch
            }
        }
    }
}

//! Port definitions for the issue tracker and the wall clock.
//!
//! These traits define *what* the dispatcher needs from the outside world.
//! Infrastructure crates (the `github` crate today) define *how* to supply it.
//! Pagination, authentication and rate limiting are entirely the adapter's
//! concern; the domain only ever sees a lazy sequence of issues.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::{
    ColumnId, IssueId, IssueNumber, IssueState, Label, NewIssue, ProjectId, Timestamp,
    TrackedIssue, TrackerError,
};

/// A lazy, finite, non-restartable sequence of issues.
///
/// Pages are fetched on demand; dropping the stream stops fetching. An `Err`
/// item means the listing failed and no further items should be expected.
pub type IssueStream<'a> = BoxStream<'a, Result<TrackedIssue, TrackerError>>;

/// Issue source and action executor for a single repository.
///
/// Implementations are bound to one repository at construction; none of the
/// methods take repository coordinates.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Streams every issue carrying `label`, in both open and closed state, in
    /// the tracker's own order.
    fn list_issues<'a>(&'a self, label: &'a Label) -> IssueStream<'a>;

    /// Appends a comment to an existing issue.
    async fn create_comment(&self, issue: IssueNumber, body: &str) -> Result<(), TrackerError>;

    /// Moves an existing issue to `state`.
    async fn set_issue_state(
        &self,
        issue: IssueNumber,
        state: IssueState,
    ) -> Result<(), TrackerError>;

    /// Files a new issue and returns it as the tracker recorded it.
    async fn create_issue(&self, issue: &NewIssue) -> Result<TrackedIssue, TrackerError>;
}

/// Project-board placement for newly filed issues.
///
/// Lookups are by exact name and return `Ok(None)` when nothing matches;
/// whether that is an error is the caller's decision.
#[async_trait]
pub trait ProjectBoard: Send + Sync {
    /// Finds a project by its display name.
    async fn find_project_by_name(&self, name: &str) -> Result<Option<ProjectId>, TrackerError>;

    /// Finds a column of `project` by its display name.
    async fn find_column_by_name(
        &self,
        project: ProjectId,
        name: &str,
    ) -> Result<Option<ColumnId>, TrackerError>;

    /// Adds a card for `issue` to `column`.
    async fn attach_issue_to_column(
        &self,
        column: ColumnId,
        issue: IssueId,
    ) -> Result<(), TrackerError>;
}

/// Source of "now" for age computations.
pub trait Clock: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> Timestamp;
}

/// [`Clock`] backed by the system's wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

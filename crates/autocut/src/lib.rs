//! Deduplicated issue filing: the autocut domain.
//!
//! Given an event (a title plus free-form details), [`Cutter::cut`] decides
//! whether to ignore it, annotate an existing issue, reopen a recently closed
//! one, or file a new issue, based on the state and age of the first prior
//! issue with the same title.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed from an issue tracker; infrastructure crates
//! define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`IssueNumber`, `Label`, `CutRunId`, etc.) |
//! | [`types`] | Value types (`TrackedIssue`, `AgeThreshold`, `Timestamp`, etc.) |
//! | [`errors`] | `TrackerError`, `CutError` and `RetryPolicy` |
//! | [`tracker`] | Port traits: `IssueTracker`, `ProjectBoard`, `Clock` |
//! | [`matcher`] | Title matching and age classification |
//! | [`cutter`] | The dispatcher that turns a classification into one action |

mod duration;

pub mod cutter;
pub mod errors;
pub mod identifiers;
pub mod matcher;
pub mod tracker;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use cutter::{CutRequest, CutResult, Cutter, CutterConfig, Disposition, ProjectPlacement};
pub use duration::ParseDurationError;
pub use errors::{CutError, ResourceKind, RetryPolicy, TrackerError};
pub use identifiers::{
    ColumnId, CutRunId, IssueId, IssueNumber, Label, ProjectId, RepositoryName, RepositoryOwner,
};
pub use matcher::{Classification, MatchedIssue, Matcher};
pub use tracker::{Clock, IssueStream, IssueTracker, ProjectBoard, SystemClock};
pub use types::{AgeThreshold, ElapsedAge, IssueState, NewIssue, Timestamp, TrackedIssue};

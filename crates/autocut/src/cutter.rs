//! The dispatcher: one classification, exactly one action.
//!
//! [`Cutter::cut`] lists the sentinel-labelled issues once, classifies them
//! with the [`Matcher`], and then performs the single action the
//! classification calls for:
//!
//! | Classification | Action | Disposition |
//! |----------------|--------|-------------|
//! | `RecentOpen`   | none | `IgnoredRecentlyUpdated` |
//! | `StaleOpen`    | comment | `UpdatedStale` |
//! | `RecentClosed` | reopen, then comment | `ReopenedRecent` |
//! | `NoMatch`      | create (+ project card) | `OpenedNew` |
//!
//! Any tracker failure aborts the cut. Steps already taken are not rolled
//! back: a reopen followed by a failed comment leaves the issue reopened.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::matcher::{Classification, MatchedIssue, Matcher};
use crate::tracker::{Clock, IssueTracker, ProjectBoard, SystemClock};
use crate::{
    AgeThreshold, CutError, CutRunId, IssueState, Label, NewIssue, ResourceKind, TrackedIssue,
};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Project and column a freshly filed issue is placed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectPlacement {
    pub project: String,
    pub column: String,
}

/// Construction-time configuration of a [`Cutter`].
#[derive(Debug, Clone)]
pub struct CutterConfig {
    /// Label marking the issues this tool manages. Listing is scoped to it and
    /// every new issue carries it.
    pub label: Label,

    /// Age separating recent from stale activity.
    pub threshold: AgeThreshold,

    /// Where new issues are placed, if anywhere.
    pub placement: Option<ProjectPlacement>,
}

impl CutterConfig {
    /// Config with the default sentinel label and no project placement.
    pub fn new(threshold: AgeThreshold) -> Self {
        Self {
            label: Label::sentinel(),
            threshold,
            placement: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Requests and results
// ---------------------------------------------------------------------------

/// One event to file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutRequest {
    title: String,
    details: String,
    custom_labels: Vec<Label>,
}

impl CutRequest {
    /// Validates and builds a request.
    ///
    /// Title and details must be non-empty. Both are kept verbatim, and the
    /// title is matched without trimming or case folding.
    pub fn new(
        title: impl Into<String>,
        details: impl Into<String>,
        custom_labels: Vec<Label>,
    ) -> Result<Self, CutError> {
        let title = title.into();
        let details = details.into();
        if title.is_empty() {
            return Err(CutError::InvalidInput {
                message: "issue title must not be empty".to_string(),
            });
        }
        if details.is_empty() {
            return Err(CutError::InvalidInput {
                message: "event details must not be empty".to_string(),
            });
        }
        Ok(Self {
            title,
            details,
            custom_labels,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

/// What a cut did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    IgnoredRecentlyUpdated,
    UpdatedStale,
    ReopenedRecent,
    OpenedNew,
}

impl Disposition {
    /// Human-readable description, as printed by the CLI.
    pub fn description(self) -> &'static str {
        match self {
            Disposition::IgnoredRecentlyUpdated => "found a recently updated issue, so did nothing",
            Disposition::UpdatedStale => "updated a stale issue",
            Disposition::ReopenedRecent => "re-opened a recently closed issue",
            Disposition::OpenedNew => "opened a new issue",
        }
    }
}

impl std::fmt::Display for Disposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// The disposition of a cut and the URL of the issue it concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutResult {
    pub disposition: Disposition,
    pub issue_url: String,
}

// ---------------------------------------------------------------------------
// Comment templates
// ---------------------------------------------------------------------------

fn stale_comment(matched: &MatchedIssue, threshold: AgeThreshold, details: &str) -> String {
    format!(
        "It's been {} since the last update (which is more than the threshold of {}), \
         and the problem is still happening.\n\nUpdate:\n\n{}",
        matched.age, threshold, details
    )
}

fn reopen_comment(matched: &MatchedIssue, threshold: AgeThreshold, details: &str) -> String {
    format!(
        "Only {} has passed (less than the threshold of {}), \
         and the problem is happening again.\n\nUpdate:\n\n{}",
        matched.age, threshold, details
    )
}

/// `{sentinel} ∪ custom`, first occurrence order, duplicates dropped.
fn issue_labels(sentinel: &Label, custom: &[Label]) -> Vec<Label> {
    let mut labels = vec![sentinel.clone()];
    for label in custom {
        if !labels.contains(label) {
            labels.push(label.clone());
        }
    }
    labels
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Deduplicating issue filer bound to one repository.
pub struct Cutter {
    tracker: Arc<dyn IssueTracker>,
    board: Option<Arc<dyn ProjectBoard>>,
    clock: Arc<dyn Clock>,
    config: CutterConfig,
}

impl Cutter {
    /// Creates a cutter using the system clock.
    ///
    /// `board` is only consulted when `config.placement` is set.
    pub fn new(
        tracker: Arc<dyn IssueTracker>,
        board: Option<Arc<dyn ProjectBoard>>,
        config: CutterConfig,
    ) -> Self {
        Self {
            tracker,
            board,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replaces the clock used for age computations.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Files, annotates, reopens or ignores according to the prior issue with
    /// the same title.
    pub async fn cut(&self, request: &CutRequest) -> Result<CutResult, CutError> {
        self.cut_with_run_id(request, CutRunId::new_random()).await
    }

    /// Same as [`Cutter::cut`], recording `run_id` on the tracing span.
    pub async fn cut_with_run_id(
        &self,
        request: &CutRequest,
        run_id: CutRunId,
    ) -> Result<CutResult, CutError> {
        let span = tracing::info_span!(
            "cut",
            %run_id,
            title = %request.title,
            label = %self.config.label,
            threshold = %self.config.threshold,
        );
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: &CutRequest) -> Result<CutResult, CutError> {
        let classification = self.classify(request).await?;
        tracing::debug!(classification = classification.as_str(), "classified");

        let result = match classification {
            Classification::RecentOpen(matched) => {
                tracing::info!(
                    issue = %matched.issue.number,
                    age = %matched.age,
                    "recently updated issue exists; nothing to do"
                );
                CutResult {
                    disposition: Disposition::IgnoredRecentlyUpdated,
                    issue_url: matched.issue.url,
                }
            }
            Classification::StaleOpen(matched) => self.update_stale(matched, request).await?,
            Classification::RecentClosed(matched) => self.reopen_recent(matched, request).await?,
            Classification::NoMatch => self.open_new(request).await?,
        };

        tracing::info!(
            disposition = ?result.disposition,
            issue_url = %result.issue_url,
            "cut complete"
        );
        Ok(result)
    }

    async fn classify(&self, request: &CutRequest) -> Result<Classification, CutError> {
        let matcher = Matcher::new(self.config.threshold);
        let issues = self.tracker.list_issues(&self.config.label);
        let now = self.clock.now();
        matcher
            .classify_stream(issues, &request.title, now)
            .await
            .map_err(|source| {
                CutError::transport(
                    "list issues",
                    format!("label {}", self.config.label),
                    source,
                )
            })
    }

    async fn update_stale(
        &self,
        matched: MatchedIssue,
        request: &CutRequest,
    ) -> Result<CutResult, CutError> {
        let number = matched.issue.number;
        let body = stale_comment(&matched, self.config.threshold, &request.details);
        self.tracker
            .create_comment(number, &body)
            .await
            .map_err(|source| {
                CutError::transport("comment on issue", format!("#{number}"), source)
            })?;
        tracing::info!(issue = %number, age = %matched.age, "commented on stale issue");

        Ok(CutResult {
            disposition: Disposition::UpdatedStale,
            issue_url: matched.issue.url,
        })
    }

    async fn reopen_recent(
        &self,
        matched: MatchedIssue,
        request: &CutRequest,
    ) -> Result<CutResult, CutError> {
        let number = matched.issue.number;
        self.tracker
            .set_issue_state(number, IssueState::Open)
            .await
            .map_err(|source| CutError::transport("reopen issue", format!("#{number}"), source))?;
        tracing::info!(issue = %number, "reopened recently closed issue");

        let body = reopen_comment(&matched, self.config.threshold, &request.details);
        self.tracker
            .create_comment(number, &body)
            .await
            .map_err(|source| {
                tracing::warn!(
                    issue = %number,
                    "issue was reopened but the explanatory comment failed"
                );
                CutError::transport("comment on reopened issue", format!("#{number}"), source)
            })?;

        Ok(CutResult {
            disposition: Disposition::ReopenedRecent,
            issue_url: matched.issue.url,
        })
    }

    async fn open_new(&self, request: &CutRequest) -> Result<CutResult, CutError> {
        let new_issue = NewIssue {
            title: request.title.clone(),
            body: request.details.clone(),
            labels: issue_labels(&self.config.label, &request.custom_labels),
        };
        let created = self
            .tracker
            .create_issue(&new_issue)
            .await
            .map_err(|source| {
                CutError::transport("create issue", format!("title {:?}", request.title), source)
            })?;
        tracing::info!(issue = %created.number, url = %created.url, "opened new issue");

        if let Some(placement) = &self.config.placement {
            self.place(&created, placement).await?;
        }

        Ok(CutResult {
            disposition: Disposition::OpenedNew,
            issue_url: created.url,
        })
    }

    async fn place(
        &self,
        issue: &TrackedIssue,
        placement: &ProjectPlacement,
    ) -> Result<(), CutError> {
        let Some(board) = &self.board else {
            tracing::warn!(
                project = %placement.project,
                "project placement configured but no project board available; skipping"
            );
            return Ok(());
        };

        let project = board
            .find_project_by_name(&placement.project)
            .await
            .map_err(|source| {
                CutError::transport("find project", format!("{:?}", placement.project), source)
            })?
            .ok_or_else(|| CutError::NotFound {
                kind: ResourceKind::Project,
                name: placement.project.clone(),
                scope: None,
            })?;

        let column = board
            .find_column_by_name(project, &placement.column)
            .await
            .map_err(|source| {
                CutError::transport(
                    "find column",
                    format!("{:?} in project {project}", placement.column),
                    source,
                )
            })?
            .ok_or_else(|| CutError::NotFound {
                kind: ResourceKind::Column,
                name: placement.column.clone(),
                scope: Some(format!("project {:?}", placement.project)),
            })?;

        board
            .attach_issue_to_column(column, issue.id)
            .await
            .map_err(|source| {
                CutError::transport(
                    "create project card",
                    format!("issue #{} in column {column}", issue.number),
                    source,
                )
            })?;
        tracing::info!(
            issue = %issue.number,
            project = %placement.project,
            column = %placement.column,
            "added issue to project column"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeDelta, Utc};

    use super::*;
    use crate::{ElapsedAge, IssueId, IssueNumber, Timestamp};

    fn matched(age: TimeDelta) -> MatchedIssue {
        MatchedIssue {
            issue: TrackedIssue {
                id: IssueId::new(7),
                number: IssueNumber::new(3),
                url: "https://tracker.example/issues/3".to_string(),
                title: "X".to_string(),
                state: IssueState::Open,
                updated_at: Timestamp::from_utc(Utc::now()),
                labels: Vec::new(),
            },
            age: ElapsedAge::new(age),
        }
    }

    #[test]
    fn stale_comment_embeds_age_threshold_and_details() {
        let threshold = AgeThreshold::from_std(Duration::from_secs(3_600));
        let body = stale_comment(&matched(TimeDelta::hours(26)), threshold, "disk full on node-3");
        assert_eq!(
            body,
            "It's been 26h0m0s since the last update (which is more than the threshold of 1h0m0s), \
             and the problem is still happening.\n\nUpdate:\n\ndisk full on node-3"
        );
    }

    #[test]
    fn reopen_comment_embeds_age_threshold_and_details() {
        let threshold = AgeThreshold::from_std(Duration::from_secs(86_400));
        let body = reopen_comment(&matched(TimeDelta::minutes(90)), threshold, "again");
        assert_eq!(
            body,
            "Only 1h30m0s has passed (less than the threshold of 24h0m0s), \
             and the problem is happening again.\n\nUpdate:\n\nagain"
        );
    }

    #[test]
    fn labels_start_with_sentinel_and_drop_duplicates() {
        let sentinel = Label::sentinel();
        let custom = vec![
            Label::new("flaky").unwrap(),
            Label::new("autocut").unwrap(),
            Label::new("ci").unwrap(),
            Label::new("flaky").unwrap(),
        ];
        let names: Vec<String> = issue_labels(&sentinel, &custom)
            .into_iter()
            .map(|l| l.to_string())
            .collect();
        assert_eq!(names, ["autocut", "flaky", "ci"]);
    }

    #[test]
    fn request_requires_title_and_details() {
        assert!(matches!(
            CutRequest::new("", "details", Vec::new()),
            Err(CutError::InvalidInput { .. })
        ));
        assert!(matches!(
            CutRequest::new("title", "", Vec::new()),
            Err(CutError::InvalidInput { .. })
        ));
        let request = CutRequest::new(" Title ", "details", Vec::new()).unwrap();
        assert_eq!(request.title(), " Title ");
    }

    #[test]
    fn whitespace_only_input_is_kept_verbatim() {
        let request = CutRequest::new("  ", "\n", Vec::new()).unwrap();
        assert_eq!(request.title(), "  ");
        assert_eq!(request.details, "\n");
    }

    #[test]
    fn dispositions_have_stable_descriptions_and_wire_names() {
        assert_eq!(
            Disposition::IgnoredRecentlyUpdated.to_string(),
            "found a recently updated issue, so did nothing"
        );
        assert_eq!(Disposition::OpenedNew.description(), "opened a new issue");
        assert_eq!(
            serde_json::to_string(&Disposition::ReopenedRecent).unwrap(),
            "\"reopened_recent\""
        );
    }
}

//! Wire shapes of the GitHub REST resources this adapter touches.

use autocut::{IssueId, IssueNumber, IssueState, Label, Timestamp, TrackedIssue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct IssueDto {
    pub id: u64,
    pub number: u64,
    pub html_url: String,
    pub title: String,
    pub state: IssueState,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub labels: Vec<LabelDto>,
    /// Present only on pull requests, which share the issues endpoint.
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

impl IssueDto {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

impl From<IssueDto> for TrackedIssue {
    fn from(dto: IssueDto) -> Self {
        TrackedIssue {
            id: IssueId::new(dto.id),
            number: IssueNumber::new(dto.number),
            url: dto.html_url,
            title: dto.title,
            state: dto.state,
            updated_at: Timestamp::from_utc(dto.updated_at),
            labels: dto
                .labels
                .into_iter()
                .filter_map(|label| Label::new(label.name))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LabelDto {
    pub name: String,
}

/// A classic project or one of its columns; both only need id and name.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct NamedDto {
    pub id: u64,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct CreateIssueBody<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub labels: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CommentBody<'a> {
    pub body: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct EditStateBody {
    pub state: IssueState,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateCardBody {
    pub content_id: u64,
    pub content_type: &'static str,
}

//! [`ProjectBoard`] over classic organization projects.

use async_trait::async_trait;
use autocut::{ColumnId, IssueId, ProjectBoard, ProjectId, TrackerError};
use futures::stream::{BoxStream, TryStreamExt};

use crate::models::{CreateCardBody, NamedDto};
use crate::{GithubClient, GithubError};

/// Scans a paginated listing for the first entry named exactly `name`.
///
/// Stops fetching pages as soon as a match is found.
async fn first_named(
    mut listing: BoxStream<'_, Result<NamedDto, GithubError>>,
    name: &str,
) -> Result<Option<u64>, GithubError> {
    while let Some(entry) = listing.try_next().await? {
        if entry.name == name {
            return Ok(Some(entry.id));
        }
    }
    Ok(None)
}

#[async_trait]
impl ProjectBoard for GithubClient {
    async fn find_project_by_name(&self, name: &str) -> Result<Option<ProjectId>, TrackerError> {
        const OP: &str = "list projects";
        let url = self.api_url(&format!("/orgs/{}/projects", self.owner()));
        let first = self.first_page(&url, &[("state", "all")])?;
        let found = first_named(self.paginate(OP, first), name).await?;
        tracing::debug!(project = name, found = found.is_some(), "project lookup");
        Ok(found.map(ProjectId::new))
    }

    async fn find_column_by_name(
        &self,
        project: ProjectId,
        name: &str,
    ) -> Result<Option<ColumnId>, TrackerError> {
        const OP: &str = "list project columns";
        let url = self.api_url(&format!("/projects/{project}/columns"));
        let first = self.first_page(&url, &[])?;
        let found = first_named(self.paginate(OP, first), name).await?;
        tracing::debug!(%project, column = name, found = found.is_some(), "column lookup");
        Ok(found.map(ColumnId::new))
    }

    async fn attach_issue_to_column(
        &self,
        column: ColumnId,
        issue: IssueId,
    ) -> Result<(), TrackerError> {
        let url = self.api_url(&format!("/projects/columns/{column}/cards"));
        let body = CreateCardBody {
            content_id: issue.as_u64(),
            content_type: "Issue",
        };
        let request = self.http().post(url).json(&body);
        self.send("create project card", request).await?;
        Ok(())
    }
}

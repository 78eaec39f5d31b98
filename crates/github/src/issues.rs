//! [`IssueTracker`] over the repository issues endpoints.

use async_trait::async_trait;
use autocut::{
    IssueNumber, IssueState, IssueStream, IssueTracker, Label, NewIssue, TrackedIssue,
    TrackerError,
};
use futures::future;
use futures::stream::{self, StreamExt, TryStreamExt};

use crate::models::{CommentBody, CreateIssueBody, EditStateBody, IssueDto};
use crate::GithubClient;

#[async_trait]
impl IssueTracker for GithubClient {
    fn list_issues<'a>(&'a self, label: &'a Label) -> IssueStream<'a> {
        const OP: &str = "list issues";
        let first = match self.first_page(
            &self.repo_url("/issues"),
            &[("labels", label.as_str()), ("state", "all")],
        ) {
            Ok(url) => url,
            Err(err) => return stream::once(future::ready(Err(err.into()))).boxed(),
        };

        self.paginate::<IssueDto>(OP, first)
            .try_filter(|dto| {
                let keep = !dto.is_pull_request();
                if !keep {
                    tracing::trace!(number = dto.number, "skipping pull request");
                }
                future::ready(keep)
            })
            .map_ok(TrackedIssue::from)
            .map_err(TrackerError::from)
            .boxed()
    }

    async fn create_comment(&self, issue: IssueNumber, body: &str) -> Result<(), TrackerError> {
        let url = self.repo_url(&format!("/issues/{issue}/comments"));
        let request = self.http().post(url).json(&CommentBody { body });
        self.send("create comment", request).await?;
        Ok(())
    }

    async fn set_issue_state(
        &self,
        issue: IssueNumber,
        state: IssueState,
    ) -> Result<(), TrackerError> {
        let url = self.repo_url(&format!("/issues/{issue}"));
        let request = self.http().patch(url).json(&EditStateBody { state });
        self.send("set issue state", request).await?;
        Ok(())
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<TrackedIssue, TrackerError> {
        let body = CreateIssueBody {
            title: &issue.title,
            body: &issue.body,
            labels: issue.labels.iter().map(Label::as_str).collect(),
        };
        let request = self.http().post(self.repo_url("/issues")).json(&body);
        let created: IssueDto = self.send_json("create issue", request).await?;
        Ok(created.into())
    }
}

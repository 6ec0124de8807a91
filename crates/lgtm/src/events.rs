//! GitHub webhook payloads consumed by the LGTM handlers.
//!
//! Only the fields the handlers read are modelled. Issue comments and review
//! bodies are both turned into a [`GenericCommentEvent`] so commands are
//! handled the same way wherever they are typed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::github::{PullRequest, Repository, User};

/// Action on an `issue_comment` delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCommentAction {
    Created,
    Edited,
    Deleted,
    #[serde(other)]
    Other,
}

/// Issue or pull request a comment was made on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    /// Issue author
    pub user: User,
    /// open or closed
    pub state: String,
    #[serde(default)]
    pub assignees: Vec<User>,
    #[serde(default)]
    pub html_url: String,
    /// Present only when the issue is a pull request
    #[serde(default)]
    pub pull_request: Option<Value>,
}

impl Issue {
    #[must_use]
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    #[serde(default)]
    pub body: String,
    pub user: User,
    #[serde(default)]
    pub html_url: String,
}

/// `issue_comment` webhook payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueCommentEvent {
    pub action: IssueCommentAction,
    pub issue: Issue,
    pub comment: Comment,
    pub repository: Repository,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenericCommentAction {
    Created,
    Edited,
    Deleted,
}

/// A comment from any surface, flattened to what command handling needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericCommentEvent {
    pub is_pr: bool,
    pub action: GenericCommentAction,
    pub body: String,
    pub html_url: String,
    /// Comment author
    pub author: String,
    pub org: String,
    pub repo: String,
    pub number: u64,
    pub issue_author: String,
    pub issue_state: String,
    pub assignees: Vec<String>,
}

impl GenericCommentEvent {
    /// Flatten an issue comment. Unknown actions yield `None`.
    #[must_use]
    pub fn from_issue_comment(event: &IssueCommentEvent) -> Option<Self> {
        let action = match event.action {
            IssueCommentAction::Created => GenericCommentAction::Created,
            IssueCommentAction::Edited => GenericCommentAction::Edited,
            IssueCommentAction::Deleted => GenericCommentAction::Deleted,
            IssueCommentAction::Other => return None,
        };
        Some(Self {
            is_pr: event.issue.is_pull_request(),
            action,
            body: event.comment.body.clone(),
            html_url: event.comment.html_url.clone(),
            author: event.comment.user.login.clone(),
            org: event.repository.owner.login.clone(),
            repo: event.repository.name.clone(),
            number: event.issue.number,
            issue_author: event.issue.user.login.clone(),
            issue_state: event.issue.state.clone(),
            assignees: logins(&event.issue.assignees),
        })
    }

    /// Flatten a review that carries a body. Reviews without text, or with an
    /// unknown action, yield `None`.
    #[must_use]
    pub fn from_review(event: &ReviewEvent) -> Option<Self> {
        if event.review.body.trim().is_empty() {
            return None;
        }
        let action = match event.action {
            ReviewAction::Submitted => GenericCommentAction::Created,
            ReviewAction::Edited => GenericCommentAction::Edited,
            ReviewAction::Dismissed => GenericCommentAction::Deleted,
            ReviewAction::Other => return None,
        };
        let pr = &event.pull_request;
        Some(Self {
            is_pr: true,
            action,
            body: event.review.body.clone(),
            html_url: event.review.html_url.clone(),
            author: event.review.user.login.clone(),
            org: event.repository.owner.login.clone(),
            repo: event.repository.name.clone(),
            number: pr.number,
            issue_author: pr.user.login.clone(),
            issue_state: pr.state.clone(),
            assignees: logins(&pr.assignees),
        })
    }
}

/// Action on a `pull_request_review` delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Submitted,
    Edited,
    Dismissed,
    #[serde(other)]
    Other,
}

/// Review verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    Approved,
    ChangesRequested,
    Commented,
    Dismissed,
    Pending,
    Unknown,
}

impl ReviewState {
    /// Parse a state string in any case.
    #[must_use]
    pub fn parse(state: &str) -> Self {
        match state.to_uppercase().as_str() {
            "APPROVED" => Self::Approved,
            "CHANGES_REQUESTED" => Self::ChangesRequested,
            "COMMENTED" => Self::Commented,
            "DISMISSED" => Self::Dismissed,
            "PENDING" => Self::Pending,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: u64,
    pub user: User,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
    pub state: String,
    #[serde(default)]
    pub html_url: String,
}

/// `pull_request_review` webhook payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewEvent {
    pub action: ReviewAction,
    pub review: Review,
    pub pull_request: PullRequest,
    pub repository: Repository,
}

/// Action on a `pull_request` delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestAction {
    Opened,
    Edited,
    Closed,
    Reopened,
    Synchronize,
    Labeled,
    Unlabeled,
    #[serde(other)]
    Other,
}

/// `pull_request` webhook payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestEvent {
    pub action: PullRequestAction,
    pub number: u64,
    pub pull_request: PullRequest,
    pub repository: Repository,
}

fn logins(users: &[User]) -> Vec<String> {
    users.iter().map(|u| u.login.clone()).collect()
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

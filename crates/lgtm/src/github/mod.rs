//! GitHub platform surface used by the LGTM handlers.
//!
//! [`GitHubApi`] is the capability the handlers depend on; [`GitHubClient`]
//! implements it over the REST API.

mod client;

pub use client::{GitHubClient, GitHubError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// GitHub User
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User login
    pub login: String,
}

impl User {
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
        }
    }
}

/// GitHub Label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Label name
    pub name: String,
}

/// Comment on an issue or pull request conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueComment {
    pub id: u64,
    #[serde(default)]
    pub body: String,
    pub user: User,
    #[serde(default)]
    pub html_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IssueComment {
    /// Whether the comment was edited after it was posted.
    #[must_use]
    pub fn is_edited(&self) -> bool {
        self.updated_at != self.created_at
    }
}

/// GitHub Repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Repository name
    pub name: String,
    /// Full name (org/repo)
    #[serde(default)]
    pub full_name: String,
    /// Owning user or organization
    pub owner: User,
}

/// Git reference (branch)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRef {
    /// Branch name
    #[serde(rename = "ref")]
    pub ref_name: String,
    /// SHA
    pub sha: String,
    /// Repository the branch lives in
    #[serde(default)]
    pub repo: Option<Repository>,
}

/// GitHub Pull Request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// PR author
    pub user: User,
    /// PR state (open, closed)
    #[serde(default)]
    pub state: String,
    /// Whether PR was merged
    #[serde(default)]
    pub merged: bool,
    /// Source branch
    pub head: GitRef,
    /// Target branch
    pub base: GitRef,
    #[serde(default)]
    pub assignees: Vec<User>,
    #[serde(default)]
    pub html_url: String,
}

/// File touched by a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestChange {
    pub filename: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    pub sha: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitCommit {
    pub tree: Tree,
}

/// Commit as returned by the single-commit endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryCommit {
    pub sha: String,
    pub commit: GitCommit,
}

impl RepositoryCommit {
    /// SHA of the tree the commit points at.
    #[must_use]
    pub fn tree_sha(&self) -> &str {
        &self.commit.tree.sha
    }
}

/// Organization team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

/// Platform operations needed to manage the LGTM label.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// Login of the account the bot acts as.
    fn bot_login(&self) -> String;

    async fn is_collaborator(&self, org: &str, repo: &str, login: &str)
        -> Result<bool, GitHubError>;

    async fn add_label(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        label: &str,
    ) -> Result<(), GitHubError>;

    async fn remove_label(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        label: &str,
    ) -> Result<(), GitHubError>;

    async fn get_issue_labels(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<Label>, GitHubError>;

    async fn assign_issue(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        logins: &[String],
    ) -> Result<(), GitHubError>;

    async fn create_comment(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> Result<(), GitHubError>;

    async fn delete_comment(&self, org: &str, repo: &str, id: u64) -> Result<(), GitHubError>;

    /// Comments in creation order, oldest first.
    async fn list_issue_comments(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<IssueComment>, GitHubError>;

    async fn get_pull_request(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequest, GitHubError>;

    async fn get_pull_request_changes(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<PullRequestChange>, GitHubError>;

    async fn get_single_commit(
        &self,
        org: &str,
        repo: &str,
        sha: &str,
    ) -> Result<RepositoryCommit, GitHubError>;

    async fn list_teams(&self, org: &str) -> Result<Vec<Team>, GitHubError>;

    /// Members of every role.
    async fn list_team_members(&self, org: &str, team_slug: &str)
        -> Result<Vec<User>, GitHubError>;

    async fn request_review(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        logins: &[String],
    ) -> Result<(), GitHubError>;
}

/// Normalize a login for comparison: lower case, no leading `@`.
#[must_use]
pub fn norm_login(login: &str) -> String {
    login.trim_start_matches('@').to_lowercase()
}

/// Whether `candidate` is the bot, including the `[bot]` form used by GitHub Apps.
#[must_use]
pub fn is_bot_user(bot_login: &str, candidate: &str) -> bool {
    let bot = bot_login.trim_end_matches("[bot]");
    let candidate = candidate.trim_end_matches("[bot]");
    !bot.is_empty() && bot.eq_ignore_ascii_case(candidate)
}

/// Whether `label` is present, ignoring case.
#[must_use]
pub fn has_label(label: &str, labels: &[Label]) -> bool {
    labels.iter().any(|l| l.name.eq_ignore_ascii_case(label))
}

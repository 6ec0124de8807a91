//! Tree hash bookkeeping.
//!
//! Granting LGTM posts a notification that embeds the tree hash of the head
//! commit. A later push keeps the label when its tree hash matches the most
//! recent unedited notification posted by the bot.

use crate::commands::parse_add_notification;
use crate::github::{is_bot_user, GitHubApi, GitHubError, IssueComment};

/// Tree hash recorded by the newest unedited grant notification from the bot.
#[must_use]
pub fn last_lgtm_tree_hash(comments: &[IssueComment], bot_login: &str) -> Option<String> {
    comments
        .iter()
        .rev()
        .filter(|c| is_bot_user(bot_login, &c.user.login) && !c.is_edited())
        .find_map(|c| parse_add_notification(&c.body))
        .map(str::to_string)
}

/// List the comments on a pull request and return the recorded tree hash, if any.
pub async fn find_last_lgtm_tree_hash(
    github: &dyn GitHubApi,
    org: &str,
    repo: &str,
    number: u64,
) -> Result<Option<String>, GitHubError> {
    let comments = github.list_issue_comments(org, repo, number).await?;
    Ok(last_lgtm_tree_hash(&comments, &github.bot_login()))
}

/// Tree hash of a commit.
pub async fn current_tree_hash(
    github: &dyn GitHubApi,
    org: &str,
    repo: &str,
    sha: &str,
) -> Result<String, GitHubError> {
    let commit = github.get_single_commit(org, repo, sha).await?;
    Ok(commit.tree_sha().to_string())
}

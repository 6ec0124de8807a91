//! Removal of stale bot notifications.

use tracing::{debug, error};

use crate::engine::{Outcome, SecondaryStep};
use crate::github::{is_bot_user, GitHubApi, IssueComment};

/// Deletes bot comments on one pull request.
pub struct CommentPruner<'a> {
    github: &'a dyn GitHubApi,
    org: &'a str,
    repo: &'a str,
    number: u64,
}

impl<'a> CommentPruner<'a> {
    #[must_use]
    pub fn new(github: &'a dyn GitHubApi, org: &'a str, repo: &'a str, number: u64) -> Self {
        Self {
            github,
            org,
            repo,
            number,
        }
    }

    /// Delete every bot comment matching `should_prune`. Failures are recorded
    /// and the remaining comments are still attempted.
    pub async fn prune_comments<F>(&self, should_prune: F, outcome: &mut Outcome)
    where
        F: Fn(&IssueComment) -> bool,
    {
        let comments = match self
            .github
            .list_issue_comments(self.org, self.repo, self.number)
            .await
        {
            Ok(comments) => comments,
            Err(e) => {
                error!(
                    org = %self.org,
                    repo = %self.repo,
                    pr_number = self.number,
                    error = %e,
                    "Failed to list comments for pruning."
                );
                outcome.record(SecondaryStep::ListComments, &e);
                return;
            }
        };

        let bot_login = self.github.bot_login();
        for comment in comments
            .iter()
            .filter(|c| is_bot_user(&bot_login, &c.user.login) && should_prune(c))
        {
            debug!(comment_id = comment.id, "Pruning stale notification.");
            if let Err(e) = self
                .github
                .delete_comment(self.org, self.repo, comment.id)
                .await
            {
                error!(comment_id = comment.id, error = %e, "Failed to delete comment.");
                outcome.record(SecondaryStep::DeleteComment, &e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{is_remove_notification, REMOVE_NOTIFICATION};
    use crate::engine::Action;
    use crate::github::{GitHubError, MockGitHubApi, User};
    use chrono::Utc;
    use mockall::predicate::eq;

    fn comment(id: u64, login: &str, body: &str) -> IssueComment {
        let now = Utc::now();
        IssueComment {
            id,
            body: body.to_string(),
            user: User::new(login),
            html_url: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_prunes_only_matching_bot_comments() {
        let mut github = MockGitHubApi::new();
        github.expect_bot_login().return_const("lgtm-bot".to_string());
        github.expect_list_issue_comments().returning(|_, _, _| {
            Ok(vec![
                comment(1, "lgtm-bot", REMOVE_NOTIFICATION),
                comment(2, "alice", REMOVE_NOTIFICATION),
                comment(3, "lgtm-bot", "something else"),
                comment(4, "lgtm-bot", REMOVE_NOTIFICATION),
            ])
        });
        github
            .expect_delete_comment()
            .with(eq("org"), eq("repo"), eq(1))
            .times(1)
            .returning(|_, _, _| Ok(()));
        github
            .expect_delete_comment()
            .with(eq("org"), eq("repo"), eq(4))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut outcome = Outcome::new(Action::Added);
        CommentPruner::new(&github, "org", "repo", 9)
            .prune_comments(|c| is_remove_notification(&c.body), &mut outcome)
            .await;
        assert!(!outcome.is_degraded());
    }

    #[tokio::test]
    async fn test_delete_failure_continues() {
        let mut github = MockGitHubApi::new();
        github.expect_bot_login().return_const("lgtm-bot".to_string());
        github.expect_list_issue_comments().returning(|_, _, _| {
            Ok(vec![
                comment(1, "lgtm-bot", REMOVE_NOTIFICATION),
                comment(2, "lgtm-bot", REMOVE_NOTIFICATION),
            ])
        });
        github
            .expect_delete_comment()
            .with(eq("org"), eq("repo"), eq(1))
            .returning(|_, _, _| {
                Err(GitHubError::Api {
                    status: 404,
                    message: "gone".to_string(),
                })
            });
        github
            .expect_delete_comment()
            .with(eq("org"), eq("repo"), eq(2))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut outcome = Outcome::new(Action::Added);
        CommentPruner::new(&github, "org", "repo", 9)
            .prune_comments(|c| is_remove_notification(&c.body), &mut outcome)
            .await;
        assert_eq!(outcome.secondary_failures.len(), 1);
        assert_eq!(
            outcome.secondary_failures[0].step,
            SecondaryStep::DeleteComment
        );
    }

    #[tokio::test]
    async fn test_list_failure_is_recorded() {
        let mut github = MockGitHubApi::new();
        github.expect_list_issue_comments().returning(|_, _, _| {
            Err(GitHubError::Api {
                status: 500,
                message: "boom".to_string(),
            })
        });
        github.expect_delete_comment().never();

        let mut outcome = Outcome::new(Action::Added);
        CommentPruner::new(&github, "org", "repo", 9)
            .prune_comments(|_| true, &mut outcome)
            .await;
        assert_eq!(
            outcome.secondary_failures[0].step,
            SecondaryStep::ListComments
        );
    }
}

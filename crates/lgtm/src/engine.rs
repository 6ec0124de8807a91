//! LGTM label state transitions.
//!
//! Every event is normalized into an [`LgtmRequest`] (or, for pushes, a pull
//! request snapshot) and run through this module. The label mutation always
//! happens before notifications, so a failed notification never hides a
//! label change. Failures of notification, assignment and pruning steps are
//! collected on the [`Outcome`] and logged; everything else aborts the event
//! with an [`LgtmError`].

use std::fmt;
use tracing::{error, info};

use crate::authorize::{authorize, Authorization};
use crate::commands::{
    add_notification, is_add_notification, is_remove_notification, Intent, REMOVE_NOTIFICATION,
};
use crate::config::{LgtmOptions, PluginConfig};
use crate::error::LgtmError;
use crate::exemption::is_exempt;
use crate::github::{has_label, GitHubApi, PullRequest};
use crate::owners::OwnersResolver;
use crate::pruner::CommentPruner;
use crate::response::format_response_raw;
use crate::tree_hash::{current_tree_hash, find_last_lgtm_tree_hash};
use crate::LGTM_LABEL;

/// Collaborators an event handler needs. Nothing here is mutated.
#[derive(Clone, Copy)]
pub struct LgtmContext<'a> {
    pub github: &'a dyn GitHubApi,
    pub owners: &'a dyn OwnersResolver,
    pub config: &'a PluginConfig,
}

/// What the handler did with the label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// The event is not one this plugin reacts to.
    Ignored,
    /// The actor may not change the label; a reply was posted.
    Denied(String),
    /// The label already had the requested state.
    Unchanged,
    Added,
    Removed,
    /// A push kept the label because the tree did not change.
    Kept,
    /// A push kept the label because the author is in the trusted team.
    Exempt,
}

impl Action {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ignored => "ignored",
            Self::Denied(_) => "denied",
            Self::Unchanged => "unchanged",
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Kept => "kept",
            Self::Exempt => "exempt",
        }
    }
}

/// Best-effort step that failed without aborting the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondaryStep {
    ReadLabels,
    AssignReviewer,
    LookupHead,
    StoreTreeHash,
    ListComments,
    DeleteComment,
    TeamLookup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryFailure {
    pub step: SecondaryStep,
    pub message: String,
}

/// Result of a fully handled event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub action: Action,
    pub secondary_failures: Vec<SecondaryFailure>,
}

impl Outcome {
    #[must_use]
    pub fn new(action: Action) -> Self {
        Self {
            action,
            secondary_failures: Vec::new(),
        }
    }

    #[must_use]
    pub fn ignored() -> Self {
        Self::new(Action::Ignored)
    }

    /// Note a best-effort failure.
    pub fn record(&mut self, step: SecondaryStep, err: impl fmt::Display) {
        self.secondary_failures.push(SecondaryFailure {
            step,
            message: err.to_string(),
        });
    }

    /// Whether any best-effort step failed.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.secondary_failures.is_empty()
    }
}

/// A comment or review normalized into a request to change the label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LgtmRequest {
    pub intent: Intent,
    /// Who asked for the change.
    pub author: String,
    pub issue_author: String,
    pub body: String,
    pub html_url: String,
    pub org: String,
    pub repo: String,
    pub number: u64,
    pub assignees: Vec<String>,
}

/// Apply a comment or review request to the label.
pub async fn handle(ctx: &LgtmContext<'_>, req: &LgtmRequest) -> Result<Outcome, LgtmError> {
    let (org, repo, number) = (req.org.as_str(), req.repo.as_str(), req.number);
    let mut outcome = Outcome::new(Action::Unchanged);

    if let Authorization::Denied(reason) = authorize(ctx, req, &mut outcome).await? {
        info!(
            org = %org,
            repo = %repo,
            pr_number = number,
            author = %req.author,
            "Reply to /lgtm request with comment: \"{}\"",
            reason
        );
        let reply = format_response_raw(&req.body, &req.html_url, &req.author, &reason);
        ctx.github
            .create_comment(org, repo, number, &reply)
            .await
            .map_err(LgtmError::Comment)?;
        outcome.action = Action::Denied(reason);
        return Ok(outcome);
    }

    let has_lgtm = current_signal(ctx.github, org, repo, number, &mut outcome).await;
    let opts = ctx.config.lgtm_for(org, repo);

    match (has_lgtm, req.intent) {
        (true, Intent::Revoke) => {
            info!(org = %org, repo = %repo, pr_number = number, "Removing LGTM label.");
            remove_lgtm_and_request_review(
                ctx.github,
                org,
                repo,
                number,
                &req.assignees,
                opts.store_tree_hash,
            )
            .await?;
            if opts.store_tree_hash {
                CommentPruner::new(ctx.github, org, repo, number)
                    .prune_comments(|c| is_add_notification(&c.body), &mut outcome)
                    .await;
            }
            outcome.action = Action::Removed;
        }
        (false, Intent::Grant) => {
            info!(org = %org, repo = %repo, pr_number = number, "Adding LGTM label.");
            ctx.github
                .add_label(org, repo, number, LGTM_LABEL)
                .await
                .map_err(LgtmError::AddLabel)?;
            if !is_exempt(ctx.github, &opts, &req.issue_author, org, &mut outcome).await {
                if opts.store_tree_hash {
                    store_tree_hash(ctx.github, org, repo, number, &mut outcome).await;
                }
                CommentPruner::new(ctx.github, org, repo, number)
                    .prune_comments(|c| is_remove_notification(&c.body), &mut outcome)
                    .await;
            }
            outcome.action = Action::Added;
        }
        _ => {}
    }

    Ok(outcome)
}

/// Drop the label after a push unless the tree is unchanged or the author is trusted.
pub async fn handle_push(
    ctx: &LgtmContext<'_>,
    org: &str,
    repo: &str,
    pr: &PullRequest,
) -> Result<Outcome, LgtmError> {
    let number = pr.number;
    let mut outcome = Outcome::new(Action::Unchanged);
    let opts = ctx.config.lgtm_for(org, repo);

    if is_exempt(ctx.github, &opts, &pr.user.login, org, &mut outcome).await {
        outcome.action = Action::Exempt;
        return Ok(outcome);
    }

    if !current_signal(ctx.github, org, repo, number, &mut outcome).await {
        return Ok(outcome);
    }

    if opts.store_tree_hash && tree_unchanged(ctx.github, org, repo, pr, &mut outcome).await? {
        outcome.action = Action::Kept;
        return Ok(outcome);
    }

    let assignees: Vec<String> = pr.assignees.iter().map(|u| u.login.clone()).collect();
    remove_lgtm_and_request_review(
        ctx.github,
        org,
        repo,
        number,
        &assignees,
        opts.store_tree_hash,
    )
    .await?;

    info!(
        org = %org,
        repo = %repo,
        pr_number = number,
        "Commenting with an LGTM removed notification: {}",
        REMOVE_NOTIFICATION
    );
    ctx.github
        .create_comment(org, repo, number, REMOVE_NOTIFICATION)
        .await
        .map_err(LgtmError::Comment)?;

    outcome.action = Action::Removed;
    Ok(outcome)
}

/// Whether the head tree matches the tree recorded by the last LGTM.
async fn tree_unchanged(
    github: &dyn GitHubApi,
    org: &str,
    repo: &str,
    pr: &PullRequest,
    outcome: &mut Outcome,
) -> Result<bool, LgtmError> {
    let last = match find_last_lgtm_tree_hash(github, org, repo, pr.number).await {
        Ok(last) => last,
        Err(e) => {
            error!(error = %e, "Failed to get issue comments.");
            outcome.record(SecondaryStep::ListComments, &e);
            None
        }
    };
    let Some(last) = last else {
        return Ok(false);
    };

    let current = current_tree_hash(github, org, repo, &pr.head.sha)
        .await
        .map_err(|source| LgtmError::Commit {
            sha: pr.head.sha.clone(),
            source,
        })?;
    if current == last {
        info!(
            tree = %current,
            "Keeping LGTM label as the tree-hash remained the same"
        );
        return Ok(true);
    }
    Ok(false)
}

/// Post a notification recording the head tree hash.
async fn store_tree_hash(
    github: &dyn GitHubApi,
    org: &str,
    repo: &str,
    number: u64,
    outcome: &mut Outcome,
) {
    let pr = match github.get_pull_request(org, repo, number).await {
        Ok(pr) => pr,
        Err(e) => {
            error!(error = %e, "Failed to get pull request.");
            outcome.record(SecondaryStep::LookupHead, &e);
            return;
        }
    };
    let tree_hash = match current_tree_hash(github, org, repo, &pr.head.sha).await {
        Ok(tree) => tree,
        Err(e) => {
            error!(sha = %pr.head.sha, error = %e, "Failed to get commit.");
            outcome.record(SecondaryStep::LookupHead, &e);
            return;
        }
    };
    info!(tree = %tree_hash, "Adding comment to store tree-hash.");
    if let Err(e) = github
        .create_comment(org, repo, number, &add_notification(&tree_hash))
        .await
    {
        error!(error = %e, "Failed to add comment.");
        outcome.record(SecondaryStep::StoreTreeHash, &e);
    }
}

/// Whether the label is present. A failed lookup counts as absent.
async fn current_signal(
    github: &dyn GitHubApi,
    org: &str,
    repo: &str,
    number: u64,
    outcome: &mut Outcome,
) -> bool {
    match github.get_issue_labels(org, repo, number).await {
        Ok(labels) => has_label(LGTM_LABEL, &labels),
        Err(e) => {
            error!(error = %e, "Failed to get issue labels.");
            outcome.record(SecondaryStep::ReadLabels, &e);
            false
        }
    }
}

/// Remove the label and, when tree hashes are stored, ask the assignees to review again.
pub(crate) async fn remove_lgtm_and_request_review(
    github: &dyn GitHubApi,
    org: &str,
    repo: &str,
    number: u64,
    assignees: &[String],
    store_tree_hash: bool,
) -> Result<(), LgtmError> {
    github
        .remove_label(org, repo, number, LGTM_LABEL)
        .await
        .map_err(LgtmError::RemoveLabel)?;

    if store_tree_hash && !assignees.is_empty() {
        github
            .request_review(org, repo, number, assignees)
            .await
            .map_err(LgtmError::RequestReview)?;
    }
    Ok(())
}

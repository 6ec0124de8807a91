//! Who may add or remove the LGTM label.
//!
//! Rules, in order:
//! 1. Authors can never LGTM their own pull request.
//! 2. Outside repositories that opt out, only collaborators may change the
//!    label, and a collaborator who is not yet assigned gets assigned.
//! 3. In repositories that skip collaborator checks, the actor must be an
//!    approver or reviewer in the OWNERS files covering the changed files.
//!
//! The PR author may always cancel their own LGTM.

use std::collections::BTreeSet;
use tracing::{debug, error, info};

use crate::engine::{LgtmContext, LgtmRequest, Outcome, SecondaryStep};
use crate::error::LgtmError;
use crate::github::norm_login;

pub const SELF_LGTM_DENIED: &str = "you cannot LGTM your own PR.";
pub const COLLABORATORS_ONLY: &str = "changing LGTM is restricted to collaborators";
pub const OWNERS_ONLY: &str =
    "adding LGTM is restricted to approvers and reviewers in OWNERS files.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Allowed,
    /// Carries the reply shown to the actor.
    Denied(String),
}

/// Decide whether `req.author` may apply `req.intent`.
///
/// Assignment of the actor is best effort and recorded on `outcome`. Platform
/// lookups needed for the decision abort with an error.
pub async fn authorize(
    ctx: &LgtmContext<'_>,
    req: &LgtmRequest,
    outcome: &mut Outcome,
) -> Result<Authorization, LgtmError> {
    let (org, repo, number) = (req.org.as_str(), req.repo.as_str(), req.number);

    let is_author = req.author == req.issue_author;
    if is_author && req.intent.wants_lgtm() {
        return Ok(Authorization::Denied(SELF_LGTM_DENIED.to_string()));
    }

    let is_assignee = req.assignees.iter().any(|a| *a == req.author);
    let skip_collaborators = ctx.config.skip_collaborators(org, repo);

    let is_collaborator = ctx
        .github
        .is_collaborator(org, repo, &req.author)
        .await
        .map_err(|source| {
            error!(error = %source, "Failed to check if author is a collaborator.");
            LgtmError::CollaboratorCheck {
                login: req.author.clone(),
                source,
            }
        })?;

    if !is_author && !skip_collaborators && !is_collaborator {
        return Ok(Authorization::Denied(COLLABORATORS_ONLY.to_string()));
    }

    if !is_author && !is_assignee && !skip_collaborators {
        info!(
            "Assigning {}/{}#{} to {}",
            org, repo, number, req.author
        );
        if let Err(e) = ctx
            .github
            .assign_issue(org, repo, number, &[req.author.clone()])
            .await
        {
            error!(error = %e, "Failed to assign {}/{}#{} to {}", org, repo, number, req.author);
            outcome.record(SecondaryStep::AssignReviewer, &e);
        }
    } else if !is_author && skip_collaborators {
        debug!(
            "Skipping collaborator checks and loading OWNERS for {}/{}#{}",
            org, repo, number
        );
        let reviewers = load_reviewers(ctx, org, repo, number).await?;
        if !reviewers.contains(&norm_login(&req.author)) {
            return Ok(Authorization::Denied(OWNERS_ONLY.to_string()));
        }
    }

    Ok(Authorization::Allowed)
}

/// Approvers and reviewers from every OWNERS file covering the changed files.
async fn load_reviewers(
    ctx: &LgtmContext<'_>,
    org: &str,
    repo: &str,
    number: u64,
) -> Result<BTreeSet<String>, LgtmError> {
    let pr = ctx
        .github
        .get_pull_request(org, repo, number)
        .await
        .map_err(|source| LgtmError::PullRequest {
            org: org.to_string(),
            repo: repo.to_string(),
            number,
            source,
        })?;

    let filenames: Vec<String> = ctx
        .github
        .get_pull_request_changes(org, repo, number)
        .await
        .map_err(|source| LgtmError::ChangedFiles {
            org: org.to_string(),
            repo: repo.to_string(),
            number,
            source,
        })?
        .into_iter()
        .map(|change| change.filename)
        .collect();

    let owners = ctx
        .owners
        .load_repo_owners(org, repo, &pr.base.ref_name, &filenames)
        .await
        .map_err(|source| LgtmError::Owners {
            org: org.to_string(),
            repo: repo.to_string(),
            source,
        })?;

    Ok(owners.reviewers_for_files(&filenames))
}

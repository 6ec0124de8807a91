//! Event entry points.
//!
//! Each handler filters out deliveries the plugin does not react to and turns
//! the rest into a call on the [`engine`](crate::engine).

use tracing::debug;

use crate::commands::{contains_command, parse_command, Intent};
use crate::engine::{self, Action, LgtmContext, LgtmRequest, Outcome};
use crate::error::LgtmError;
use crate::events::{
    GenericCommentAction, GenericCommentEvent, PullRequestAction, PullRequestEvent, ReviewAction,
    ReviewEvent, ReviewState,
};

/// Handle a `/lgtm` style command from an issue comment or review body.
pub async fn handle_generic_comment(
    ctx: &LgtmContext<'_>,
    event: &GenericCommentEvent,
) -> Result<Outcome, LgtmError> {
    if !event.is_pr
        || event.action != GenericCommentAction::Created
        || event.issue_state != "open"
    {
        return Ok(Outcome::ignored());
    }

    let Some(intent) = parse_command(&event.body) else {
        return Ok(Outcome::ignored());
    };

    let req = LgtmRequest {
        intent,
        author: event.author.clone(),
        issue_author: event.issue_author.clone(),
        body: event.body.clone(),
        html_url: event.html_url.clone(),
        org: event.org.clone(),
        repo: event.repo.clone(),
        number: event.number,
        assignees: event.assignees.clone(),
    };
    engine::handle(ctx, &req).await
}

/// Treat approve and request-changes reviews as adding and removing LGTM
/// when the repository opts in.
pub async fn handle_pull_request_review(
    ctx: &LgtmContext<'_>,
    event: &ReviewEvent,
) -> Result<Outcome, LgtmError> {
    if event.action != ReviewAction::Submitted {
        return Ok(Outcome::ignored());
    }

    let org = event.repository.owner.login.as_str();
    let repo = event.repository.name.as_str();
    if !ctx.config.lgtm_for(org, repo).review_acts_as_lgtm {
        return Ok(Outcome::ignored());
    }

    // Commands in the body are handled as a comment.
    if contains_command(&event.review.body) {
        debug!(
            pr_number = event.pull_request.number,
            "Review body carries an LGTM command; leaving it to the comment handler."
        );
        return Ok(Outcome::ignored());
    }

    let intent = match ReviewState::parse(&event.review.state) {
        ReviewState::Approved => Intent::Grant,
        ReviewState::ChangesRequested => Intent::Revoke,
        _ => return Ok(Outcome::ignored()),
    };

    let pr = &event.pull_request;
    let req = LgtmRequest {
        intent,
        author: event.review.user.login.clone(),
        issue_author: pr.user.login.clone(),
        body: event.review.body.clone(),
        html_url: event.review.html_url.clone(),
        org: org.to_string(),
        repo: repo.to_string(),
        number: pr.number,
        assignees: pr.assignees.iter().map(|u| u.login.clone()).collect(),
    };
    engine::handle(ctx, &req).await
}

/// Handle a review delivery.
///
/// A review acts through its verdict, and its body is also treated as a
/// comment. At most one of the two changes the label, since the verdict is
/// ignored whenever the body carries a command.
pub async fn handle_review(
    ctx: &LgtmContext<'_>,
    event: &ReviewEvent,
) -> Result<Outcome, LgtmError> {
    let outcome = handle_pull_request_review(ctx, event).await?;
    if outcome.action != Action::Ignored {
        return Ok(outcome);
    }
    match GenericCommentEvent::from_review(event) {
        Some(generic) => handle_generic_comment(ctx, &generic).await,
        None => Ok(outcome),
    }
}

/// Revoke LGTM when new commits are pushed to the pull request.
pub async fn handle_pull_request(
    ctx: &LgtmContext<'_>,
    event: &PullRequestEvent,
) -> Result<Outcome, LgtmError> {
    if event.pull_request.merged || event.action != PullRequestAction::Synchronize {
        return Ok(Outcome::ignored());
    }

    let org = event.repository.owner.login.as_str();
    let repo = event.repository.name.as_str();
    engine::handle_push(ctx, org, repo, &event.pull_request).await
}

//! Error types for LGTM event handling.
//!
//! An [`LgtmError`] means the event was abandoned. Failures of best-effort
//! steps are not errors; they are reported on the
//! [`Outcome`](crate::engine::Outcome) instead.

use thiserror::Error;

use crate::github::GitHubError;
use crate::owners::OwnersError;

#[derive(Debug, Error)]
pub enum LgtmError {
    /// Collaborator status could not be determined
    #[error("failed to check if {login} is a collaborator: {source}")]
    CollaboratorCheck {
        login: String,
        #[source]
        source: GitHubError,
    },

    /// OWNERS files could not be loaded
    #[error("failed to load OWNERS for {org}/{repo}: {source}")]
    Owners {
        org: String,
        repo: String,
        #[source]
        source: OwnersError,
    },

    /// Pull request lookup failed
    #[error("failed to get pull request {org}/{repo}#{number}: {source}")]
    PullRequest {
        org: String,
        repo: String,
        number: u64,
        #[source]
        source: GitHubError,
    },

    /// Changed files could not be listed
    #[error("cannot get PR changes for {org}/{repo}#{number}: {source}")]
    ChangedFiles {
        org: String,
        repo: String,
        number: u64,
        #[source]
        source: GitHubError,
    },

    /// Commit lookup needed for the tree hash failed
    #[error("failed to get commit {sha}: {source}")]
    Commit {
        sha: String,
        #[source]
        source: GitHubError,
    },

    #[error("failed adding lgtm label: {0}")]
    AddLabel(#[source] GitHubError),

    #[error("failed removing lgtm label: {0}")]
    RemoveLabel(#[source] GitHubError),

    #[error("failed to re-request review: {0}")]
    RequestReview(#[source] GitHubError),

    /// A reply or notification that is part of the primary action failed
    #[error("failed to create comment: {0}")]
    Comment(#[source] GitHubError),
}

//! LGTM label automation for GitHub pull requests.
//!
//! This crate provides:
//! - Command parsing for `/lgtm`, `/lgtm cancel` and `/remove-lgtm`
//! - Authorization of who may add or remove the `lgtm` label
//! - Tree-hash tracking so that rebases and squashes keep the label
//! - A trusted-team exemption for authors whose pushes never drop the label
//! - Webhook payload types, signature verification and an HTTP server
//! - A GitHub REST client and an OWNERS file resolver
//!
//! # Entry points
//!
//! The three event handlers take the platform client and configuration
//! explicitly through a [`LgtmContext`]:
//!
//! - [`handle_generic_comment`] for `/lgtm` style commands
//! - [`handle_pull_request_review`] for approve / request-changes reviews
//! - [`handle_pull_request`] for pushes to an open pull request

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Every handler can fail on a platform call

pub mod authorize;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod exemption;
pub mod github;
pub mod handlers;
pub mod help;
pub mod owners;
pub mod pruner;
pub mod response;
pub mod server;
pub mod tree_hash;
pub mod webhooks;

pub use config::{Config, LgtmOptions, PluginConfig};
pub use engine::{Action, LgtmContext, Outcome, SecondaryFailure, SecondaryStep};
pub use error::LgtmError;
pub use github::{GitHubApi, GitHubClient, GitHubError};
pub use handlers::{
    handle_generic_comment, handle_pull_request, handle_pull_request_review, handle_review,
};
pub use owners::{GitHubOwnersResolver, OwnersResolver, RepoOwners};

/// Name of the label managed by this crate.
pub const LGTM_LABEL: &str = "lgtm";

//! Comment command grammar and notification templates.
//!
//! Commands are matched per line and case-insensitively. Notification
//! comments are written by the bot and parsed back when a push arrives.

use regex::Regex;
use std::sync::LazyLock;

/// Matches `/lgtm` and `/lgtm no-issue` on a line of their own.
pub static LGTM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mi)^/lgtm(?: no-issue)?\s*$").unwrap());

/// Matches `/remove-lgtm` and `/lgtm cancel` on a line of their own.
pub static LGTM_CANCEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mi)^/(remove-lgtm|lgtm cancel)\s*$").unwrap());

const ADD_NOTIFICATION_PREFIX: &str = "LGTM label has been added.  <details>Git tree hash: ";
const ADD_NOTIFICATION_SUFFIX: &str = "</details>";

/// Captures the tree hash out of a grant notification.
static ADD_NOTIFICATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        "{}(.*){}",
        regex::escape(ADD_NOTIFICATION_PREFIX),
        regex::escape(ADD_NOTIFICATION_SUFFIX)
    ))
    .unwrap()
});

/// Body of the comment posted when a push drops the label.
pub const REMOVE_NOTIFICATION: &str = "New changes are detected. LGTM label has been removed.";

/// Requested change to the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Add the label.
    Grant,
    /// Remove the label.
    Revoke,
}

impl Intent {
    #[must_use]
    pub const fn wants_lgtm(self) -> bool {
        matches!(self, Self::Grant)
    }
}

/// Parse a comment body into a command. Grant wins when both appear.
#[must_use]
pub fn parse_command(body: &str) -> Option<Intent> {
    if LGTM_RE.is_match(body) {
        Some(Intent::Grant)
    } else if LGTM_CANCEL_RE.is_match(body) {
        Some(Intent::Revoke)
    } else {
        None
    }
}

/// Whether the body carries any LGTM command.
#[must_use]
pub fn contains_command(body: &str) -> bool {
    parse_command(body).is_some()
}

/// Render the grant notification for a tree hash.
#[must_use]
pub fn add_notification(tree_hash: &str) -> String {
    format!("{ADD_NOTIFICATION_PREFIX}{tree_hash}{ADD_NOTIFICATION_SUFFIX}")
}

/// Extract the tree hash from a grant notification body.
#[must_use]
pub fn parse_add_notification(body: &str) -> Option<&str> {
    ADD_NOTIFICATION_RE
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Whether the body is a grant notification.
#[must_use]
pub fn is_add_notification(body: &str) -> bool {
    ADD_NOTIFICATION_RE.is_match(body)
}

/// Whether the body contains the push-removal notification.
#[must_use]
pub fn is_remove_notification(body: &str) -> bool {
    body.contains(REMOVE_NOTIFICATION)
}

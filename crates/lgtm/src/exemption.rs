//! Trusted-team exemption for sticky LGTM.
//!
//! When a repository names a trusted team, pull requests opened by its members
//! keep the label across pushes, and granting on them skips the tree hash
//! bookkeeping.

use tracing::{error, info};

use crate::config::LgtmOptions;
use crate::engine::{Outcome, SecondaryStep};
use crate::github::{norm_login, GitHubApi};

/// Whether `author` belongs to the repository's trusted team.
///
/// Lookup failures and a missing team both count as "not exempt" and are
/// recorded on `outcome`.
pub async fn is_exempt(
    github: &dyn GitHubApi,
    opts: &LgtmOptions,
    author: &str,
    org: &str,
    outcome: &mut Outcome,
) -> bool {
    let team_name = opts.trusted_team_for_sticky_lgtm.as_str();
    if team_name.is_empty() {
        return false;
    }

    let teams = match github.list_teams(org).await {
        Ok(teams) => teams,
        Err(e) => {
            error!(org = %org, error = %e, "Failed to list teams in org.");
            outcome.record(SecondaryStep::TeamLookup, &e);
            return false;
        }
    };

    let Some(team) = teams
        .iter()
        .find(|t| t.name == team_name || t.slug == team_name)
    else {
        error!(org = %org, team = %team_name, "Trusted team for sticky LGTM not found.");
        outcome.record(
            SecondaryStep::TeamLookup,
            format!("team {team_name} not found in {org}"),
        );
        return false;
    };

    let members = match github.list_team_members(org, &team.slug).await {
        Ok(members) => members,
        Err(e) => {
            error!(org = %org, team = %team.slug, error = %e, "Failed to list members in team.");
            outcome.record(SecondaryStep::TeamLookup, &e);
            return false;
        }
    };

    let author = norm_login(author);
    if members.iter().any(|m| norm_login(&m.login) == author) {
        info!(author = %author, team = %team.name, "Author is a member of the trusted team.");
        return true;
    }
    false
}

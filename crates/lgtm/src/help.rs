//! Plugin help shown to users.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::PluginConfig;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Command {
    pub usage: String,
    pub description: String,
    pub who_can_use: String,
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PluginHelp {
    pub description: String,
    /// Configuration notes keyed by `org/repo`.
    pub config: BTreeMap<String, String>,
    pub commands: Vec<Command>,
}

/// Help for the given `org/repo` names.
///
/// Repositories without any LGTM options are left out of the notes.
#[must_use]
pub fn plugin_help(config: &PluginConfig, repos: &[String]) -> PluginHelp {
    let config_notes = repos
        .iter()
        .filter_map(|full_name| {
            let (org, repo) = full_name.split_once('/')?;
            let notes = repo_notes(config, org, repo)?;
            Some((full_name.clone(), notes))
        })
        .collect();

    PluginHelp {
        description: "The lgtm plugin manages the application and removal of the 'lgtm' \
            (Looks Good To Me) label which is typically used to gate merging."
            .to_string(),
        config: config_notes,
        commands: vec![Command {
            usage: "/[remove-]lgtm [cancel] or GitHub Review action".to_string(),
            description: "Adds or removes the 'lgtm' label which is typically used to gate \
                merging."
                .to_string(),
            who_can_use: "Collaborators on the repository. '/lgtm cancel' can be used \
                additionally by the PR author."
                .to_string(),
            examples: vec![
                "/lgtm".to_string(),
                "/lgtm cancel".to_string(),
                "/remove-lgtm".to_string(),
                "<a href=\"https://help.github.com/articles/about-pull-request-reviews/\">\
                 'Approve' or 'Request Changes'</a>"
                    .to_string(),
            ],
        }],
    }
}

/// HTML list of the options set for a repository, `None` when nothing is set.
fn repo_notes(config: &PluginConfig, org: &str, repo: &str) -> Option<String> {
    let opts = config.lgtm_for(org, repo);
    let mut items = Vec::new();
    if opts.review_acts_as_lgtm {
        items.push(
            "Reviews of \"approve\" or \"request changes\" act as adding or removing LGTM."
                .to_string(),
        );
    }
    if opts.store_tree_hash {
        items.push("Squashing commits does not remove LGTM.".to_string());
    }
    if !opts.trusted_team_for_sticky_lgtm.is_empty() {
        items.push(format!(
            "Commits from \"{}\" do not remove LGTM.",
            opts.trusted_team_for_sticky_lgtm
        ));
    }
    if items.is_empty() {
        return None;
    }

    let mut lines = vec!["The plugin has the following configuration:<ul>".to_string()];
    lines.extend(items.into_iter().map(|item| format!("<li>{item}</li>")));
    lines.push("</ul>".to_string());
    Some(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notes_per_repo() {
        let config = PluginConfig::from_yaml(
            "lgtm:\n\
             - repos: [org/repo]\n  review_acts_as_lgtm: true\n  store_tree_hash: true\n  trusted_team_for_sticky_lgtm: release\n",
        )
        .unwrap();
        let help = plugin_help(
            &config,
            &["org/repo".to_string(), "org/other".to_string(), "bogus".to_string()],
        );

        assert_eq!(help.config.len(), 1);
        assert_eq!(
            help.config["org/repo"],
            "The plugin has the following configuration:<ul>\n\
             <li>Reviews of \"approve\" or \"request changes\" act as adding or removing LGTM.</li>\n\
             <li>Squashing commits does not remove LGTM.</li>\n\
             <li>Commits from \"release\" do not remove LGTM.</li>\n\
             </ul>"
        );
        assert!(!help.config.contains_key("org/other"));
        assert_eq!(help.commands[0].examples[0], "/lgtm");
    }

    #[test]
    fn test_skip_collaborators_alone_is_not_listed() {
        let config =
            PluginConfig::from_yaml("owners:\n  skip_collaborators: [org/repo]\n").unwrap();
        let help = plugin_help(&config, &["org/repo".to_string()]);
        assert!(help.config.is_empty());
    }
}

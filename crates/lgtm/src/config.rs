//! Configuration for the LGTM service.
//!
//! Service settings come from the environment; per-repository behaviour comes
//! from a YAML plugin file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Service configuration.
#[derive(Clone)]
pub struct Config {
    /// HTTP server port.
    pub port: u16,
    /// GitHub token for API calls.
    pub github_token: Option<String>,
    /// Secret used to sign GitHub webhook deliveries.
    pub webhook_secret: Option<String>,
    /// GitHub REST API base URL.
    pub github_api_url: String,
    /// Login the bot comments as. Looked up from the token when unset.
    pub bot_login: Option<String>,
    /// Path to the YAML plugin configuration.
    pub plugin_config_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: env::var("LGTM_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8888),
            github_token: env::var("GITHUB_TOKEN").ok().filter(|s| !s.is_empty()),
            webhook_secret: env::var("GITHUB_WEBHOOK_SECRET")
                .ok()
                .filter(|s| !s.is_empty()),
            github_api_url: env::var("GITHUB_API_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "https://api.github.com".to_string()),
            bot_login: env::var("LGTM_BOT_LOGIN").ok().filter(|s| !s.is_empty()),
            plugin_config_path: env::var("LGTM_PLUGIN_CONFIG")
                .ok()
                .filter(|s| !s.is_empty()),
        }
    }
}

impl Config {
    /// Load the plugin configuration, or the defaults when no path is set.
    pub fn load_plugin_config(&self) -> Result<PluginConfig> {
        match &self.plugin_config_path {
            Some(path) => PluginConfig::from_file(path),
            None => Ok(PluginConfig::default()),
        }
    }
}

/// Per-repository LGTM behaviour.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LgtmOptions {
    /// Entries are `org` or `org/repo`.
    pub repos: Vec<String>,
    /// Approve and request-changes reviews add and remove the label.
    pub review_acts_as_lgtm: bool,
    /// Record the tree hash on LGTM so pushes that keep the tree keep the label.
    pub store_tree_hash: bool,
    /// Pushes from members of this team never remove the label.
    pub trusted_team_for_sticky_lgtm: String,
}

/// OWNERS related settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OwnersConfig {
    /// Orgs or `org/repo` entries that use OWNERS files instead of collaborator checks.
    pub skip_collaborators: Vec<String>,
}

/// YAML plugin configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PluginConfig {
    pub lgtm: Vec<LgtmOptions>,
    pub owners: OwnersConfig,
}

impl PluginConfig {
    /// Read and parse a YAML plugin file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read plugin config {}", path.display()))?;
        Self::from_yaml(&raw)
            .with_context(|| format!("Failed to parse plugin config {}", path.display()))
    }

    /// Parse a YAML plugin document.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).context("Invalid plugin config YAML")
    }

    /// Options for a repository. An `org/repo` entry beats an `org` entry.
    #[must_use]
    pub fn lgtm_for(&self, org: &str, repo: &str) -> LgtmOptions {
        let full_name = format!("{org}/{repo}");
        self.lgtm
            .iter()
            .find(|opts| opts.repos.iter().any(|r| *r == full_name))
            .or_else(|| {
                self.lgtm
                    .iter()
                    .find(|opts| opts.repos.iter().any(|r| r == org))
            })
            .cloned()
            .unwrap_or_default()
    }

    /// Whether the repository relies on OWNERS files instead of collaborators.
    #[must_use]
    pub fn skip_collaborators(&self, org: &str, repo: &str) -> bool {
        let full_name = format!("{org}/{repo}");
        self.owners
            .skip_collaborators
            .iter()
            .any(|elem| elem == org || *elem == full_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"
lgtm:
  - repos: [kubernetes]
    review_acts_as_lgtm: true
  - repos: [kubernetes/test-infra]
    store_tree_hash: true
    trusted_team_for_sticky_lgtm: team1
owners:
  skip_collaborators:
    - other-org
    - kubernetes/website
";

    #[test]
    fn test_lgtm_for_prefers_repo_entry() {
        let config = PluginConfig::from_yaml(SAMPLE).unwrap();

        let opts = config.lgtm_for("kubernetes", "test-infra");
        assert!(opts.store_tree_hash);
        assert!(!opts.review_acts_as_lgtm);
        assert_eq!(opts.trusted_team_for_sticky_lgtm, "team1");

        let opts = config.lgtm_for("kubernetes", "kubernetes");
        assert!(opts.review_acts_as_lgtm);
        assert!(!opts.store_tree_hash);
    }

    #[test]
    fn test_lgtm_for_unknown_repo_defaults() {
        let config = PluginConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.lgtm_for("nobody", "repo"), LgtmOptions::default());
    }

    #[test]
    fn test_skip_collaborators() {
        let config = PluginConfig::from_yaml(SAMPLE).unwrap();
        assert!(config.skip_collaborators("other-org", "anything"));
        assert!(config.skip_collaborators("kubernetes", "website"));
        assert!(!config.skip_collaborators("kubernetes", "test-infra"));
    }

    #[test]
    fn test_empty_document() {
        let config = PluginConfig::from_yaml("{}").unwrap();
        assert!(config.lgtm.is_empty());
        assert!(config.owners.skip_collaborators.is_empty());
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        assert!(PluginConfig::from_yaml("lgtm: [").is_err());
    }
}

//! OWNERS file resolution.
//!
//! An OWNERS file lists the approvers and reviewers of the directory it lives
//! in and everything below it. Owners of a path are the union of the OWNERS
//! files from its directory up to the repository root, unless a file sets
//! `options.no_parent_owners`. Names defined in the root `OWNERS_ALIASES`
//! file expand to their members.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;
use tracing::debug;

use crate::github::{norm_login, GitHubClient, GitHubError};

const OWNERS_FILE: &str = "OWNERS";
const ALIASES_FILE: &str = "OWNERS_ALIASES";

#[derive(Debug, Error)]
pub enum OwnersError {
    #[error("GitHub request failed: {0}")]
    GitHub(#[from] GitHubError),

    #[error("invalid OWNERS file {path}: {message}")]
    Parse { path: String, message: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct OwnersFileOptions {
    no_parent_owners: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct OwnersFile {
    approvers: Vec<String>,
    reviewers: Vec<String>,
    options: OwnersFileOptions,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct AliasesFile {
    aliases: HashMap<String, Vec<String>>,
}

/// Owners of every directory that carries an OWNERS file.
#[derive(Debug, Clone, Default)]
pub struct RepoOwners {
    dirs: HashMap<String, OwnersFile>,
}

impl RepoOwners {
    /// Build from `(path, contents)` pairs of OWNERS files.
    pub fn from_files<'a>(
        files: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, OwnersError> {
        Self::from_files_with_aliases(None, files)
    }

    /// Build from OWNERS files, expanding names listed in an `OWNERS_ALIASES`
    /// document.
    pub fn from_files_with_aliases<'a>(
        aliases: Option<&str>,
        files: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, OwnersError> {
        let aliases = match aliases {
            Some(contents) => parse_aliases(contents)?,
            None => HashMap::new(),
        };

        let mut dirs = HashMap::new();
        for (path, contents) in files {
            let parsed: OwnersFile =
                serde_yaml::from_str(contents).map_err(|e| OwnersError::Parse {
                    path: path.to_string(),
                    message: e.to_string(),
                })?;
            dirs.insert(parent_dir(path).to_string(), normalize(parsed, &aliases));
        }
        Ok(Self { dirs })
    }

    /// Approvers for a file path.
    #[must_use]
    pub fn approvers(&self, path: &str) -> BTreeSet<String> {
        self.collect(path, |file| &file.approvers)
    }

    /// Reviewers for a file path.
    #[must_use]
    pub fn reviewers(&self, path: &str) -> BTreeSet<String> {
        self.collect(path, |file| &file.reviewers)
    }

    /// Approvers and reviewers across all the given paths.
    #[must_use]
    pub fn reviewers_for_files<S: AsRef<str>>(&self, paths: &[S]) -> BTreeSet<String> {
        let mut all = BTreeSet::new();
        for path in paths {
            all.extend(self.approvers(path.as_ref()));
            all.extend(self.reviewers(path.as_ref()));
        }
        all
    }

    fn collect(&self, path: &str, pick: impl Fn(&OwnersFile) -> &Vec<String>) -> BTreeSet<String> {
        let mut owners = BTreeSet::new();
        let mut dir = parent_dir(path);
        loop {
            if let Some(file) = self.dirs.get(dir) {
                owners.extend(pick(file).iter().cloned());
                if file.options.no_parent_owners {
                    break;
                }
            }
            if dir.is_empty() {
                break;
            }
            dir = parent_dir(dir);
        }
        owners
    }
}

fn parse_aliases(contents: &str) -> Result<HashMap<String, Vec<String>>, OwnersError> {
    let parsed: AliasesFile = serde_yaml::from_str(contents).map_err(|e| OwnersError::Parse {
        path: ALIASES_FILE.to_string(),
        message: e.to_string(),
    })?;
    Ok(parsed
        .aliases
        .into_iter()
        .map(|(name, members)| (name.to_lowercase(), members))
        .collect())
}

fn normalize(mut file: OwnersFile, aliases: &HashMap<String, Vec<String>>) -> OwnersFile {
    file.approvers = expand(&file.approvers, aliases);
    file.reviewers = expand(&file.reviewers, aliases);
    file
}

fn expand(names: &[String], aliases: &HashMap<String, Vec<String>>) -> Vec<String> {
    names
        .iter()
        .flat_map(|name| match aliases.get(&name.to_lowercase()) {
            Some(members) => members.iter().map(|m| norm_login(m)).collect(),
            None => vec![norm_login(name)],
        })
        .collect()
}

/// Directory portion of a slash separated path, `""` for the root.
fn parent_dir(path: &str) -> &str {
    path.rfind('/').map_or("", |idx| &path[..idx])
}

/// OWNERS file paths that can govern any of `paths`.
fn candidate_owners_files<S: AsRef<str>>(paths: &[S]) -> BTreeSet<String> {
    let mut candidates = BTreeSet::new();
    for path in paths {
        let mut dir = parent_dir(path.as_ref());
        loop {
            let file = if dir.is_empty() {
                OWNERS_FILE.to_string()
            } else {
                format!("{dir}/{OWNERS_FILE}")
            };
            // Ancestors of a known directory are already present.
            if !candidates.insert(file) || dir.is_empty() {
                break;
            }
            dir = parent_dir(dir);
        }
    }
    candidates
}

/// Loads the OWNERS files that govern a set of paths at a given ref.
#[async_trait]
pub trait OwnersResolver: Send + Sync {
    async fn load_repo_owners(
        &self,
        org: &str,
        repo: &str,
        base_ref: &str,
        paths: &[String],
    ) -> Result<RepoOwners, OwnersError>;
}

/// Reads OWNERS files through the GitHub contents API.
///
/// Only the OWNERS file of each ancestor directory of the requested paths is
/// fetched, together with the root `OWNERS_ALIASES`.
#[derive(Debug, Clone)]
pub struct GitHubOwnersResolver {
    client: GitHubClient,
}

impl GitHubOwnersResolver {
    #[must_use]
    pub fn new(client: GitHubClient) -> Self {
        Self { client }
    }

    async fn read(
        &self,
        org: &str,
        repo: &str,
        path: &str,
        base_ref: &str,
    ) -> Result<Option<String>, OwnersError> {
        let Some(bytes) = self
            .client
            .get_file_contents(org, repo, path, base_ref)
            .await?
        else {
            return Ok(None);
        };
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| OwnersError::Parse {
                path: path.to_string(),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl OwnersResolver for GitHubOwnersResolver {
    async fn load_repo_owners(
        &self,
        org: &str,
        repo: &str,
        base_ref: &str,
        paths: &[String],
    ) -> Result<RepoOwners, OwnersError> {
        let mut files = Vec::new();
        for path in candidate_owners_files(paths) {
            if let Some(contents) = self.read(org, repo, &path, base_ref).await? {
                files.push((path, contents));
            }
        }
        let aliases = if files.is_empty() {
            None
        } else {
            self.read(org, repo, ALIASES_FILE, base_ref).await?
        };

        debug!(
            org = %org,
            repo = %repo,
            base_ref = %base_ref,
            count = files.len(),
            aliases = aliases.is_some(),
            "Loaded OWNERS files"
        );
        RepoOwners::from_files_with_aliases(
            aliases.as_deref(),
            files.iter().map(|(p, c)| (p.as_str(), c.as_str())),
        )
    }
}

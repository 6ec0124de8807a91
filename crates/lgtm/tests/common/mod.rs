//! In-memory GitHub used by the scenario tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use lgtm::config::PluginConfig;
use lgtm::events::{GenericCommentAction, GenericCommentEvent};
use lgtm::github::{
    GitCommit, GitHubApi, GitHubError, GitRef, IssueComment, Label, PullRequest,
    PullRequestChange, RepositoryCommit, Team, Tree, User,
};
use lgtm::owners::{OwnersError, OwnersResolver, RepoOwners};
use lgtm::LgtmContext;

pub const ORG: &str = "org";
pub const REPO: &str = "repo";
pub const NUMBER: u64 = 7;
pub const BOT: &str = "lgtm-bot";
pub const HEAD_SHA: &str = "head-sha";

/// Mutable platform state for a single pull request.
#[derive(Default)]
pub struct FakeState {
    pub labels: BTreeSet<String>,
    pub comments: Vec<IssueComment>,
    pub next_comment_id: u64,
    pub collaborators: BTreeSet<String>,
    pub pr: PullRequest,
    pub changes: Vec<String>,
    /// Commit SHA to tree SHA.
    pub trees: HashMap<String, String>,
    pub teams: Vec<Team>,
    /// Team slug to member logins.
    pub team_members: HashMap<String, Vec<String>>,
    pub review_requests: Vec<Vec<String>>,
    pub deleted_comments: Vec<u64>,
    /// Mutating calls in the order they happened.
    pub calls: Vec<String>,
    /// Methods that fail with a 500.
    pub failing: BTreeSet<&'static str>,
}

pub struct FakeGitHub {
    state: Mutex<FakeState>,
}

impl FakeGitHub {
    /// Bob's open pull request #7 on org/repo, with head commit `head-sha`
    /// pointing at `tree`.
    pub fn new(tree: &str) -> Self {
        let mut state = FakeState {
            next_comment_id: 1,
            ..Default::default()
        };
        state.pr = PullRequest {
            number: NUMBER,
            user: User::new("bob"),
            state: "open".to_string(),
            merged: false,
            head: GitRef {
                ref_name: "feature".to_string(),
                sha: HEAD_SHA.to_string(),
                repo: None,
            },
            base: GitRef {
                ref_name: "main".to_string(),
                sha: "base-sha".to_string(),
                repo: None,
            },
            assignees: Vec::new(),
            html_url: format!("https://github.com/{ORG}/{REPO}/pull/{NUMBER}"),
        };
        state.trees.insert(HEAD_SHA.to_string(), tree.to_string());
        state.collaborators.insert("alice".to_string());
        state.collaborators.insert("bob".to_string());
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn with_label(self) -> Self {
        self.state().labels.insert("lgtm".to_string());
        self
    }

    pub fn with_assignees(self, logins: &[&str]) -> Self {
        self.state().pr.assignees = logins.iter().map(|l| User::new(*l)).collect();
        self
    }

    pub fn fail(&self, method: &'static str) {
        self.state().failing.insert(method);
    }

    /// Point the head commit at a new tree, as a push would.
    pub fn push(&self, tree: &str) {
        self.state()
            .trees
            .insert(HEAD_SHA.to_string(), tree.to_string());
    }

    /// Add a comment as if it was posted earlier.
    pub fn seed_comment(&self, login: &str, body: &str, edited: bool) -> u64 {
        let mut state = self.state();
        let id = state.next_comment_id;
        state.next_comment_id += 1;
        let created = timestamp(id);
        state.comments.push(IssueComment {
            id,
            body: body.to_string(),
            user: User::new(login),
            html_url: String::new(),
            created_at: created,
            updated_at: if edited {
                created + Duration::seconds(30)
            } else {
                created
            },
        });
        id
    }

    pub fn has_label(&self) -> bool {
        self.state().labels.contains("lgtm")
    }

    pub fn comment_bodies(&self) -> Vec<String> {
        self.state().comments.iter().map(|c| c.body.clone()).collect()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    fn check(&self, method: &'static str) -> Result<(), GitHubError> {
        if self.state().failing.contains(method) {
            return Err(GitHubError::Api {
                status: 500,
                message: format!("{method} failed"),
            });
        }
        Ok(())
    }

    fn record(&self, call: String) {
        self.state().calls.push(call);
    }
}

fn timestamp(id: u64) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-05-01T09:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
        + Duration::minutes(i64::try_from(id).unwrap())
}

#[async_trait]
impl GitHubApi for FakeGitHub {
    fn bot_login(&self) -> String {
        BOT.to_string()
    }

    async fn is_collaborator(
        &self,
        _org: &str,
        _repo: &str,
        login: &str,
    ) -> Result<bool, GitHubError> {
        self.check("is_collaborator")?;
        Ok(self.state().collaborators.contains(login))
    }

    async fn add_label(
        &self,
        _org: &str,
        _repo: &str,
        _number: u64,
        label: &str,
    ) -> Result<(), GitHubError> {
        self.check("add_label")?;
        self.record(format!("add_label:{label}"));
        self.state().labels.insert(label.to_string());
        Ok(())
    }

    async fn remove_label(
        &self,
        _org: &str,
        _repo: &str,
        _number: u64,
        label: &str,
    ) -> Result<(), GitHubError> {
        self.check("remove_label")?;
        self.record(format!("remove_label:{label}"));
        self.state().labels.remove(label);
        Ok(())
    }

    async fn get_issue_labels(
        &self,
        _org: &str,
        _repo: &str,
        _number: u64,
    ) -> Result<Vec<Label>, GitHubError> {
        self.check("get_issue_labels")?;
        Ok(self
            .state()
            .labels
            .iter()
            .map(|name| Label { name: name.clone() })
            .collect())
    }

    async fn assign_issue(
        &self,
        _org: &str,
        _repo: &str,
        _number: u64,
        logins: &[String],
    ) -> Result<(), GitHubError> {
        self.check("assign_issue")?;
        self.record(format!("assign_issue:{}", logins.join(",")));
        let mut state = self.state();
        for login in logins {
            state.pr.assignees.push(User::new(login.as_str()));
        }
        Ok(())
    }

    async fn create_comment(
        &self,
        _org: &str,
        _repo: &str,
        _number: u64,
        body: &str,
    ) -> Result<(), GitHubError> {
        self.check("create_comment")?;
        self.record("create_comment".to_string());
        self.seed_comment(BOT, body, false);
        Ok(())
    }

    async fn delete_comment(&self, _org: &str, _repo: &str, id: u64) -> Result<(), GitHubError> {
        self.check("delete_comment")?;
        self.record(format!("delete_comment:{id}"));
        let mut state = self.state();
        state.comments.retain(|c| c.id != id);
        state.deleted_comments.push(id);
        Ok(())
    }

    async fn list_issue_comments(
        &self,
        _org: &str,
        _repo: &str,
        _number: u64,
    ) -> Result<Vec<IssueComment>, GitHubError> {
        self.check("list_issue_comments")?;
        Ok(self.state().comments.clone())
    }

    async fn get_pull_request(
        &self,
        _org: &str,
        _repo: &str,
        _number: u64,
    ) -> Result<PullRequest, GitHubError> {
        self.check("get_pull_request")?;
        Ok(self.state().pr.clone())
    }

    async fn get_pull_request_changes(
        &self,
        _org: &str,
        _repo: &str,
        _number: u64,
    ) -> Result<Vec<PullRequestChange>, GitHubError> {
        self.check("get_pull_request_changes")?;
        Ok(self
            .state()
            .changes
            .iter()
            .map(|filename| PullRequestChange {
                filename: filename.clone(),
                status: "modified".to_string(),
            })
            .collect())
    }

    async fn get_single_commit(
        &self,
        _org: &str,
        _repo: &str,
        sha: &str,
    ) -> Result<RepositoryCommit, GitHubError> {
        self.check("get_single_commit")?;
        let tree = self
            .state()
            .trees
            .get(sha)
            .cloned()
            .ok_or_else(|| GitHubError::Api {
                status: 404,
                message: format!("no commit {sha}"),
            })?;
        Ok(RepositoryCommit {
            sha: sha.to_string(),
            commit: GitCommit {
                tree: Tree { sha: tree },
            },
        })
    }

    async fn list_teams(&self, _org: &str) -> Result<Vec<Team>, GitHubError> {
        self.check("list_teams")?;
        Ok(self.state().teams.clone())
    }

    async fn list_team_members(
        &self,
        _org: &str,
        team_slug: &str,
    ) -> Result<Vec<User>, GitHubError> {
        self.check("list_team_members")?;
        Ok(self
            .state()
            .team_members
            .get(team_slug)
            .map(|members| members.iter().map(|m| User::new(m.as_str())).collect())
            .unwrap_or_default())
    }

    async fn request_review(
        &self,
        _org: &str,
        _repo: &str,
        _number: u64,
        logins: &[String],
    ) -> Result<(), GitHubError> {
        self.check("request_review")?;
        self.record(format!("request_review:{}", logins.join(",")));
        self.state().review_requests.push(logins.to_vec());
        Ok(())
    }
}

/// OWNERS files served from memory.
#[derive(Default)]
pub struct StaticOwners {
    pub files: Vec<(String, String)>,
    pub aliases: Option<String>,
}

impl StaticOwners {
    pub fn new(files: &[(&str, &str)]) -> Self {
        Self {
            files: files
                .iter()
                .map(|(path, body)| ((*path).to_string(), (*body).to_string()))
                .collect(),
            aliases: None,
        }
    }

    pub fn with_aliases(mut self, aliases: &str) -> Self {
        self.aliases = Some(aliases.to_string());
        self
    }
}

#[async_trait]
impl OwnersResolver for StaticOwners {
    async fn load_repo_owners(
        &self,
        _org: &str,
        _repo: &str,
        _base_ref: &str,
        _paths: &[String],
    ) -> Result<RepoOwners, OwnersError> {
        RepoOwners::from_files_with_aliases(
            self.aliases.as_deref(),
            self.files.iter().map(|(p, b)| (p.as_str(), b.as_str())),
        )
    }
}

pub fn context<'a>(
    github: &'a FakeGitHub,
    owners: &'a StaticOwners,
    config: &'a PluginConfig,
) -> LgtmContext<'a> {
    LgtmContext {
        github,
        owners,
        config,
    }
}

/// A new comment on the fake pull request.
pub fn comment_event(author: &str, body: &str) -> GenericCommentEvent {
    GenericCommentEvent {
        is_pr: true,
        action: GenericCommentAction::Created,
        body: body.to_string(),
        html_url: format!("https://github.com/{ORG}/{REPO}/pull/{NUMBER}#issuecomment-1"),
        author: author.to_string(),
        org: ORG.to_string(),
        repo: REPO.to_string(),
        number: NUMBER,
        issue_author: "bob".to_string(),
        issue_state: "open".to_string(),
        assignees: Vec::new(),
    }
}

/// Config with tree hash tracking on for org/repo.
pub fn tracking_config() -> PluginConfig {
    PluginConfig::from_yaml("lgtm:\n- repos: [org/repo]\n  store_tree_hash: true\n").unwrap()
}

//! GitHub REST client.

use async_trait::async_trait;
use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Method, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

use super::{GitHubApi, IssueComment, Label, PullRequest, PullRequestChange, RepositoryCommit, Team, User};

const PER_PAGE: usize = 100;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid file content: {0}")]
    InvalidContent(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
}

/// GitHub API client acting as the bot account.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: Url,
    token: String,
    bot_login: String,
}

impl GitHubClient {
    /// Create a new GitHub client.
    pub fn new(token: &str, base_url: &str, bot_login: &str) -> Result<Self, GitHubError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("lgtm-bot/1.0"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        let base_url = Url::parse(base_url)
            .map_err(|e| GitHubError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(GitHubError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            client,
            base_url,
            token: token.to_string(),
            bot_login: bot_login.to_string(),
        })
    }

    /// Replace the bot login, e.g. after looking it up with [`Self::fetch_authenticated_login`].
    #[must_use]
    pub fn with_bot_login(mut self, bot_login: &str) -> Self {
        self.bot_login = bot_login.to_string();
        self
    }

    /// Login of the account that owns the token.
    pub async fn fetch_authenticated_login(&self) -> Result<String, GitHubError> {
        let user: User = self.get_json(self.endpoint(["user"])?).await?;
        Ok(user.login)
    }

    /// Decoded contents of a file, or `None` when it does not exist.
    #[instrument(skip(self))]
    pub async fn get_file_contents(
        &self,
        org: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<Vec<u8>>, GitHubError> {
        let mut url = self.endpoint(
            ["repos", org, repo, "contents"]
                .into_iter()
                .chain(path.split('/').filter(|s| !s.is_empty())),
        )?;
        url.query_pairs_mut().append_pair("ref", git_ref);

        let response = self.send(Method::GET, url, None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let content: ContentResponse = Self::parse(response).await?;
        if content.encoding != "base64" {
            return Err(GitHubError::InvalidContent(format!(
                "unsupported encoding '{}' for {path}",
                content.encoding
            )));
        }
        // GitHub wraps the base64 payload at 60 columns.
        let compact: String = content.content.split_whitespace().collect();
        base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map(Some)
            .map_err(|e| GitHubError::InvalidContent(e.to_string()))
    }

    /// API URL for the given path segments, each percent-encoded.
    fn endpoint<I, S>(&self, segments: I) -> Result<Url, GitHubError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| GitHubError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<Response, GitHubError> {
        let mut request = self
            .client
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token));
        if let Some(body) = body {
            request = request.json(&body);
        }
        Ok(request.send().await?)
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, GitHubError> {
        let response = Self::check(response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn check(response: Response) -> Result<Response, GitHubError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(GitHubError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, GitHubError> {
        let response = self.send(Method::GET, url, None).await?;
        Self::parse(response).await
    }

    async fn get_paginated<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>, GitHubError> {
        let mut items = Vec::new();
        let mut page = 1;
        loop {
            let mut page_url = url.clone();
            page_url
                .query_pairs_mut()
                .append_pair("per_page", &PER_PAGE.to_string())
                .append_pair("page", &page.to_string());
            let batch: Vec<T> = self.get_json(page_url).await?;
            let len = batch.len();
            items.extend(batch);
            if len < PER_PAGE {
                break;
            }
            page += 1;
        }
        Ok(items)
    }

    async fn send_expect_success(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<(), GitHubError> {
        let response = self.send(method, url, body).await?;
        Self::check(response).await.map(|_| ())
    }
}

#[async_trait]
impl GitHubApi for GitHubClient {
    fn bot_login(&self) -> String {
        self.bot_login.clone()
    }

    #[instrument(skip(self))]
    async fn is_collaborator(
        &self,
        org: &str,
        repo: &str,
        login: &str,
    ) -> Result<bool, GitHubError> {
        let url = self.endpoint(["repos", org, repo, "collaborators", login])?;
        let response = self.send(Method::GET, url, None).await?;
        match response.status() {
            StatusCode::NO_CONTENT => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                let message = response.text().await.unwrap_or_default();
                Err(GitHubError::Api {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    #[instrument(skip(self))]
    async fn add_label(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        label: &str,
    ) -> Result<(), GitHubError> {
        let url = self.endpoint([
            "repos",
            org,
            repo,
            "issues",
            number.to_string().as_str(),
            "labels",
        ])?;
        self.send_expect_success(
            Method::POST,
            url,
            Some(serde_json::json!({ "labels": [label] })),
        )
        .await?;
        info!("Added label '{}' to {}/{}#{}", label, org, repo, number);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_label(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        label: &str,
    ) -> Result<(), GitHubError> {
        let url = self.endpoint([
            "repos",
            org,
            repo,
            "issues",
            number.to_string().as_str(),
            "labels",
            label,
        ])?;
        let response = self.send(Method::DELETE, url, None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            // Label doesn't exist, which is fine for removal
            debug!("Label '{}' not found on {}/{}#{}", label, org, repo, number);
            return Ok(());
        }
        Self::check(response).await?;
        info!("Removed label '{}' from {}/{}#{}", label, org, repo, number);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_issue_labels(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<Label>, GitHubError> {
        let url = self.endpoint([
            "repos",
            org,
            repo,
            "issues",
            number.to_string().as_str(),
            "labels",
        ])?;
        self.get_paginated(url).await
    }

    #[instrument(skip(self))]
    async fn assign_issue(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        logins: &[String],
    ) -> Result<(), GitHubError> {
        let url = self.endpoint([
            "repos",
            org,
            repo,
            "issues",
            number.to_string().as_str(),
            "assignees",
        ])?;
        self.send_expect_success(
            Method::POST,
            url,
            Some(serde_json::json!({ "assignees": logins })),
        )
        .await
    }

    #[instrument(skip(self, body))]
    async fn create_comment(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> Result<(), GitHubError> {
        let url = self.endpoint([
            "repos",
            org,
            repo,
            "issues",
            number.to_string().as_str(),
            "comments",
        ])?;
        self.send_expect_success(Method::POST, url, Some(serde_json::json!({ "body": body })))
            .await
    }

    #[instrument(skip(self))]
    async fn delete_comment(&self, org: &str, repo: &str, id: u64) -> Result<(), GitHubError> {
        let url = self.endpoint([
            "repos",
            org,
            repo,
            "issues",
            "comments",
            id.to_string().as_str(),
        ])?;
        self.send_expect_success(Method::DELETE, url, None).await
    }

    #[instrument(skip(self))]
    async fn list_issue_comments(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<IssueComment>, GitHubError> {
        let url = self.endpoint([
            "repos",
            org,
            repo,
            "issues",
            number.to_string().as_str(),
            "comments",
        ])?;
        self.get_paginated(url).await
    }

    #[instrument(skip(self))]
    async fn get_pull_request(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequest, GitHubError> {
        let url = self.endpoint(["repos", org, repo, "pulls", number.to_string().as_str()])?;
        self.get_json(url).await
    }

    #[instrument(skip(self))]
    async fn get_pull_request_changes(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<PullRequestChange>, GitHubError> {
        let url = self.endpoint([
            "repos",
            org,
            repo,
            "pulls",
            number.to_string().as_str(),
            "files",
        ])?;
        self.get_paginated(url).await
    }

    #[instrument(skip(self))]
    async fn get_single_commit(
        &self,
        org: &str,
        repo: &str,
        sha: &str,
    ) -> Result<RepositoryCommit, GitHubError> {
        let url = self.endpoint(["repos", org, repo, "commits", sha])?;
        self.get_json(url).await
    }

    #[instrument(skip(self))]
    async fn list_teams(&self, org: &str) -> Result<Vec<Team>, GitHubError> {
        let url = self.endpoint(["orgs", org, "teams"])?;
        self.get_paginated(url).await
    }

    #[instrument(skip(self))]
    async fn list_team_members(
        &self,
        org: &str,
        team_slug: &str,
    ) -> Result<Vec<User>, GitHubError> {
        let mut url = self.endpoint(["orgs", org, "teams", team_slug, "members"])?;
        url.query_pairs_mut().append_pair("role", "all");
        self.get_paginated(url).await
    }

    #[instrument(skip(self))]
    async fn request_review(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        logins: &[String],
    ) -> Result<(), GitHubError> {
        let url = self.endpoint([
            "repos",
            org,
            repo,
            "pulls",
            number.to_string().as_str(),
            "requested_reviewers",
        ])?;
        self.send_expect_success(
            Method::POST,
            url,
            Some(serde_json::json!({ "reviewers": logins })),
        )
        .await
    }
}

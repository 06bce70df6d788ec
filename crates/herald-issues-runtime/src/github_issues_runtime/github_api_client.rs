use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use herald_issues::github_transport_helpers::{
    is_retryable_github_status, is_retryable_github_write_status, is_retryable_transport_error,
    is_retryable_write_transport_error, parse_retry_after, retry_delay, truncate_for_error,
};
use herald_issues::{
    AuthenticatedIdentity, CreatedNote, CreatedThread, IdentityResolver, IssueThread, NewNote,
    NewThread, ThreadQuery, ThreadStore,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";

#[derive(Debug, Clone, PartialEq, Eq)]
/// How the delivering identity is discovered.
pub enum IdentityMode {
    /// `GET /app`; requires a GitHub App JWT. Creator filter is `app/<slug>`.
    App,
    /// `GET /user` for the token owner. Creator filter is the login.
    Viewer,
    Static(AuthenticatedIdentity),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    Read,
    /// Creates state; a timeout or 5xx may arrive after GitHub already stored it.
    Write,
}

impl RequestKind {
    fn retries_status(self, status: u16) -> bool {
        match self {
            Self::Read => is_retryable_github_status(status),
            Self::Write => is_retryable_github_write_status(status),
        }
    }

    fn retries_transport_error(self, error: &reqwest::Error) -> bool {
        match self {
            Self::Read => is_retryable_transport_error(error),
            Self::Write => is_retryable_write_transport_error(error),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GithubApiClientConfig {
    pub api_base: String,
    pub token: String,
    /// Bearer used only for `GET /app`; falls back to `token` when unset.
    pub app_token: Option<String>,
    pub identity_mode: IdentityMode,
    pub request_timeout_ms: u64,
    pub retry_max_attempts: usize,
    pub retry_base_delay_ms: u64,
}

impl GithubApiClientConfig {
    pub fn new(token: impl Into<String>, identity_mode: IdentityMode) -> Self {
        Self {
            api_base: DEFAULT_GITHUB_API_BASE.to_string(),
            token: token.into(),
            app_token: None,
            identity_mode,
            request_timeout_ms: 30_000,
            retry_max_attempts: 3,
            retry_base_delay_ms: 500,
        }
    }
}

#[derive(Clone)]
/// GitHub REST client backing identity resolution and the issue thread store.
pub struct GithubApiClient {
    http: reqwest::Client,
    api_base: String,
    app_token: Option<String>,
    identity_mode: IdentityMode,
    retry_max_attempts: usize,
    retry_base_delay_ms: u64,
}

impl GithubApiClient {
    pub fn new(config: GithubApiClientConfig) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("herald-issues"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            reqwest::header::HeaderValue::from_static("2022-11-28"),
        );
        let auth_header = format!("Bearer {}", config.token.trim());
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&auth_header)
                .context("invalid github authorization header")?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()
            .context("failed to create github api client")?;
        Ok(Self {
            http: client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            app_token: config
                .app_token
                .map(|token| token.trim().to_string())
                .filter(|token| !token.is_empty()),
            identity_mode: config.identity_mode,
            retry_max_attempts: config.retry_max_attempts.max(1),
            retry_base_delay_ms: config.retry_base_delay_ms.max(1),
        })
    }

    pub async fn resolve_app_identity(&self) -> Result<AuthenticatedIdentity> {
        #[derive(Deserialize)]
        struct App {
            slug: String,
            name: String,
            html_url: String,
        }

        let app: App = self
            .request_json("resolve authenticated app", RequestKind::Read, || {
                let request = self.http.get(format!("{}/app", self.api_base));
                match self.app_token.as_deref() {
                    Some(token) => request.bearer_auth(token),
                    None => request,
                }
            })
            .await?;
        Ok(AuthenticatedIdentity {
            name: app.name,
            url: app.html_url,
            creator: format!("app/{}", app.slug),
        })
    }

    pub async fn resolve_viewer_identity(&self) -> Result<AuthenticatedIdentity> {
        #[derive(Deserialize)]
        struct Viewer {
            login: String,
            html_url: String,
        }

        let viewer: Viewer = self
            .request_json("resolve authenticated user", RequestKind::Read, || {
                self.http.get(format!("{}/user", self.api_base))
            })
            .await?;
        Ok(AuthenticatedIdentity {
            name: viewer.login.clone(),
            url: viewer.html_url,
            creator: viewer.login,
        })
    }

    /// Lists one page of open issues created by `query.creator`. Pull requests are dropped.
    pub async fn list_open_issues(&self, query: &ThreadQuery) -> Result<Vec<IssueThread>> {
        let per_page = query.per_page.to_string();
        let rows: Vec<IssueThread> = self
            .request_json("list issues", RequestKind::Read, || {
                self.http
                    .get(format!(
                        "{}/repos/{}/{}/issues",
                        self.api_base, query.owner, query.repo
                    ))
                    .query(&[
                        ("state", "open"),
                        ("creator", query.creator.as_str()),
                        ("per_page", per_page.as_str()),
                    ])
            })
            .await?;
        Ok(rows
            .into_iter()
            .filter(|issue| !issue.is_pull_request())
            .collect())
    }

    pub async fn create_issue(&self, thread: &NewThread) -> Result<CreatedThread> {
        let payload = json!({ "title": thread.title, "body": thread.body });
        self.request_json("create issue", RequestKind::Write, || {
            self.http
                .post(format!(
                    "{}/repos/{}/{}/issues",
                    self.api_base, thread.owner, thread.repo
                ))
                .json(&payload)
        })
        .await
    }

    pub async fn create_issue_comment(&self, note: &NewNote) -> Result<CreatedNote> {
        let payload = json!({ "body": note.body });
        self.request_json("create issue comment", RequestKind::Write, || {
            self.http
                .post(format!(
                    "{}/repos/{}/{}/issues/{}/comments",
                    self.api_base, note.owner, note.repo, note.thread_number
                ))
                .json(&payload)
        })
        .await
    }

    async fn request_json<T, F>(
        &self,
        operation: &str,
        kind: RequestKind,
        mut request_builder: F,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnMut() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0_usize;
        loop {
            attempt = attempt.saturating_add(1);
            let response = request_builder()
                .header("x-herald-retry-attempt", attempt.saturating_sub(1).to_string())
                .send()
                .await;
            match response {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let parsed = response
                            .json::<T>()
                            .await
                            .with_context(|| format!("failed to decode github {operation}"))?;
                        return Ok(parsed);
                    }

                    let retry_after = parse_retry_after(response.headers());
                    let body = response.text().await.unwrap_or_default();
                    if attempt < self.retry_max_attempts && kind.retries_status(status.as_u16()) {
                        let delay = retry_delay(self.retry_base_delay_ms, attempt, retry_after);
                        tracing::warn!(
                            operation,
                            status = status.as_u16(),
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            "retrying github api request"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    bail!(
                        "github api {operation} failed with status {}: {}",
                        status.as_u16(),
                        truncate_for_error(&body, 800)
                    );
                }
                Err(error) => {
                    if attempt < self.retry_max_attempts && kind.retries_transport_error(&error) {
                        let delay = retry_delay(self.retry_base_delay_ms, attempt, None);
                        tracing::warn!(
                            operation,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %error,
                            "retrying github api request after transport error"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(error)
                        .with_context(|| format!("github api {operation} request failed"));
                }
            }
        }
    }
}

#[async_trait]
impl IdentityResolver for GithubApiClient {
    async fn authenticated_identity(&self) -> Result<AuthenticatedIdentity> {
        match &self.identity_mode {
            IdentityMode::App => self.resolve_app_identity().await,
            IdentityMode::Viewer => self.resolve_viewer_identity().await,
            IdentityMode::Static(identity) => Ok(identity.clone()),
        }
    }
}

#[async_trait]
impl ThreadStore for GithubApiClient {
    async fn list_open_threads(&self, query: &ThreadQuery) -> Result<Vec<IssueThread>> {
        self.list_open_issues(query).await
    }

    async fn create_thread(&self, thread: &NewThread) -> Result<CreatedThread> {
        self.create_issue(thread).await
    }

    async fn create_note(&self, note: &NewNote) -> Result<CreatedNote> {
        self.create_issue_comment(note).await
    }
}

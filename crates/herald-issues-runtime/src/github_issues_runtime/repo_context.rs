use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use herald_issues::{DefaultRepoResolver, RepoRef};
use serde::Deserialize;

pub const GITHUB_REPOSITORY_ENV: &str = "GITHUB_REPOSITORY";

#[derive(Debug, Clone)]
/// Reads `owner/repo` from an environment variable (`GITHUB_REPOSITORY` by default).
pub struct EnvRepoContext {
    var_name: String,
}

impl EnvRepoContext {
    pub fn new() -> Self {
        Self::with_var(GITHUB_REPOSITORY_ENV)
    }

    pub fn with_var(var_name: impl Into<String>) -> Self {
        Self {
            var_name: var_name.into(),
        }
    }
}

impl Default for EnvRepoContext {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DefaultRepoResolver for EnvRepoContext {
    async fn default_repo(&self) -> Result<RepoRef> {
        let raw = std::env::var(&self.var_name)
            .with_context(|| format!("environment variable {} is not set", self.var_name))?;
        RepoRef::parse(&raw).with_context(|| format!("invalid {} value", self.var_name))
    }
}

#[derive(Debug, Deserialize)]
struct EventPayload {
    repository: Option<EventRepository>,
}

#[derive(Debug, Deserialize)]
struct EventRepository {
    name: Option<String>,
    full_name: Option<String>,
    owner: Option<EventRepositoryOwner>,
}

#[derive(Debug, Deserialize)]
struct EventRepositoryOwner {
    login: Option<String>,
}

#[derive(Debug, Clone)]
/// Derives the repository from a webhook event payload file, such as `GITHUB_EVENT_PATH`.
pub struct EventPayloadRepoContext {
    path: PathBuf,
}

impl EventPayloadRepoContext {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

pub fn repo_from_event_payload(raw: &str) -> Result<RepoRef> {
    let payload: EventPayload =
        serde_json::from_str(raw).context("failed to parse event payload json")?;
    let repository = payload
        .repository
        .ok_or_else(|| anyhow!("event payload has no repository"))?;
    let owner = repository
        .owner
        .and_then(|owner| owner.login)
        .filter(|login| !login.trim().is_empty());
    let name = repository.name.filter(|name| !name.trim().is_empty());
    if let (Some(owner), Some(name)) = (owner, name) {
        return Ok(RepoRef::new(owner.trim(), name.trim()));
    }
    match repository.full_name {
        Some(full_name) => RepoRef::parse(&full_name),
        None => bail!("event payload repository is missing owner/name"),
    }
}

#[async_trait]
impl DefaultRepoResolver for EventPayloadRepoContext {
    async fn default_repo(&self) -> Result<RepoRef> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read event payload {}", self.path.display()))?;
        repo_from_event_payload(&raw)
            .with_context(|| format!("invalid event payload {}", self.path.display()))
    }
}

#[derive(Clone, Default)]
/// Tries each resolver in order and returns the first repository found.
pub struct ChainedRepoContext {
    resolvers: Vec<Arc<dyn DefaultRepoResolver>>,
}

impl std::fmt::Debug for ChainedRepoContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainedRepoContext")
            .field("resolvers", &self.resolvers.len())
            .finish()
    }
}

impl ChainedRepoContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, resolver: Arc<dyn DefaultRepoResolver>) -> Self {
        self.resolvers.push(resolver);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

#[async_trait]
impl DefaultRepoResolver for ChainedRepoContext {
    async fn default_repo(&self) -> Result<RepoRef> {
        let mut failures = Vec::new();
        for resolver in &self.resolvers {
            match resolver.default_repo().await {
                Ok(repo) => return Ok(repo),
                Err(error) => {
                    tracing::debug!(error = %format!("{error:#}"), "repo context resolver failed");
                    failures.push(format!("{error:#}"));
                }
            }
        }
        if failures.is_empty() {
            bail!("no default repository source configured");
        }
        bail!(
            "no default repository could be resolved: {}",
            failures.join("; ")
        )
    }
}

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use herald_issues::{AuthenticatedIdentity, DefaultRepoResolver, DeliveryEngine, RepoRef};
use herald_issues_runtime::{
    ChainedRepoContext, EnvRepoContext, EventPayloadRepoContext, GithubApiClient,
    GithubApiClientConfig, IdentityMode,
};

use crate::{Cli, CliIdentityMode};

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

pub fn static_identity_from_cli(cli: &Cli) -> Result<AuthenticatedIdentity> {
    let name = non_empty(cli.app_name.as_deref())
        .ok_or_else(|| anyhow!("--identity-mode static requires --app-name"))?;
    let url = non_empty(cli.app_url.as_deref())
        .ok_or_else(|| anyhow!("--identity-mode static requires --app-url"))?;
    let creator = non_empty(cli.app_creator.as_deref()).unwrap_or(name);
    Ok(AuthenticatedIdentity {
        name: name.to_string(),
        url: url.to_string(),
        creator: creator.to_string(),
    })
}

pub fn build_github_client_config(cli: &Cli) -> Result<GithubApiClientConfig> {
    let token = non_empty(cli.github_token.as_deref())
        .ok_or_else(|| anyhow!("missing GitHub token: pass --github-token or set GITHUB_TOKEN"))?;
    let identity_mode = match cli.identity_mode {
        CliIdentityMode::App => IdentityMode::App,
        CliIdentityMode::Viewer => IdentityMode::Viewer,
        CliIdentityMode::Static => IdentityMode::Static(static_identity_from_cli(cli)?),
    };
    let mut config = GithubApiClientConfig::new(token, identity_mode);
    config.api_base = cli.github_api_base.clone();
    config.app_token = cli.github_app_token.clone();
    config.request_timeout_ms = cli.request_timeout_ms;
    config.retry_max_attempts = cli.retry_max_attempts;
    config.retry_base_delay_ms = cli.retry_base_delay_ms;
    Ok(config)
}

/// Default repository sources, in priority order: `--github-repo`, the event
/// payload, then `GITHUB_REPOSITORY`.
pub fn build_repo_context(cli: &Cli) -> Result<ChainedRepoContext> {
    let mut chain = ChainedRepoContext::new();
    if let Some(raw) = non_empty(cli.github_repo.as_deref()) {
        let repo = RepoRef::parse(raw).context("invalid --github-repo")?;
        chain = chain.push(Arc::new(repo));
    }
    if let Some(path) = cli.event_path.as_ref() {
        chain = chain.push(Arc::new(EventPayloadRepoContext::new(path)));
    }
    Ok(chain.push(Arc::new(EnvRepoContext::new())))
}

pub fn build_delivery_engine(cli: &Cli) -> Result<DeliveryEngine> {
    let client = Arc::new(GithubApiClient::new(build_github_client_config(cli)?)?);
    let repo_context: Arc<dyn DefaultRepoResolver> = Arc::new(build_repo_context(cli)?);
    Ok(DeliveryEngine::new(client.clone(), repo_context, client))
}

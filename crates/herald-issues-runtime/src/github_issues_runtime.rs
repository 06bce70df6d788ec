//! GitHub-backed collaborators for the delivery engine.

mod github_api_client;
mod repo_context;


pub use github_api_client::{
    GithubApiClient, GithubApiClientConfig, IdentityMode, DEFAULT_GITHUB_API_BASE,
};
pub use repo_context::{
    repo_from_event_payload, ChainedRepoContext, EnvRepoContext, EventPayloadRepoContext,
    GITHUB_REPOSITORY_ENV,
};

use anyhow::Result;
use async_trait::async_trait;

use crate::thread::{
    AuthenticatedIdentity, CreatedNote, CreatedThread, IssueThread, NewNote, NewThread, RepoRef,
    ThreadQuery,
};

#[async_trait]
/// Resolves the identity deliveries are made as.
pub trait IdentityResolver: Send + Sync {
    async fn authenticated_identity(&self) -> Result<AuthenticatedIdentity>;
}

#[async_trait]
/// Supplies the repository used when the caller did not name one.
pub trait DefaultRepoResolver: Send + Sync {
    async fn default_repo(&self) -> Result<RepoRef>;
}

#[async_trait]
/// Issue tracker operations backing thread reconciliation.
pub trait ThreadStore: Send + Sync {
    /// Lists open threads created by `query.creator`, in tracker order, one page only.
    async fn list_open_threads(&self, query: &ThreadQuery) -> Result<Vec<IssueThread>>;

    async fn create_thread(&self, thread: &NewThread) -> Result<CreatedThread>;

    async fn create_note(&self, note: &NewNote) -> Result<CreatedNote>;
}

#[async_trait]
impl DefaultRepoResolver for RepoRef {
    async fn default_repo(&self) -> Result<RepoRef> {
        Ok(self.clone())
    }
}

#[async_trait]
impl IdentityResolver for AuthenticatedIdentity {
    async fn authenticated_identity(&self) -> Result<AuthenticatedIdentity> {
        Ok(self.clone())
    }
}

//! Content-addressed thread delivery.
//!
//! A delivery lists the caller's open threads, reuses the one carrying the
//! message fingerprint marker, and otherwise creates a new thread. Reused
//! threads may receive one follow-up note when they have gone stale.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::collaborators::{DefaultRepoResolver, IdentityResolver, ThreadStore};
use crate::fingerprint::{
    append_fingerprint_marker, body_has_fingerprint_marker, compute_fingerprint,
};
use crate::placeholder::substitute_placeholders;
use crate::thread::{NewNote, NewThread, RepoRef, ThreadQuery, THREAD_LIST_PAGE_SIZE};
use crate::update_policy::{evaluate_update_policy, DEFAULT_UPDATE_AFTER_DAYS};


#[derive(Debug, Error)]
/// Enumerates supported `DeliveryError` values.
pub enum DeliveryError {
    #[error("invalid delivery input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq)]
/// Per-delivery knobs. `Default` disables follow-up notes and uses a 7 day threshold.
pub struct DeliveryOptions {
    pub update: String,
    pub update_after_days: f64,
    pub owner: Option<String>,
    pub repo: Option<String>,
}

impl Default for DeliveryOptions {
    fn default() -> Self {
        Self {
            update: String::new(),
            update_after_days: DEFAULT_UPDATE_AFTER_DAYS,
            owner: None,
            repo: None,
        }
    }
}

impl DeliveryOptions {
    /// Both overrides, used exactly as given, or `None` when either is unset or empty.
    fn explicit_repo(&self) -> Option<RepoRef> {
        let owner = self.owner.as_deref().filter(|owner| !owner.is_empty())?;
        let repo = self.repo.as_deref().filter(|repo| !repo.is_empty())?;
        Some(RepoRef::new(owner, repo))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Thread a delivery landed on. Every receipt reflects state that exists in the tracker.
pub struct DeliveryReceipt {
    pub owner: String,
    pub repo: String,
    pub thread_number: u64,
    pub note_id: Option<u64>,
    pub is_new: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
}

#[derive(Clone)]
pub struct DeliveryEngine {
    identity: Arc<dyn IdentityResolver>,
    default_repo: Arc<dyn DefaultRepoResolver>,
    store: Arc<dyn ThreadStore>,
}

impl DeliveryEngine {
    pub fn new(
        identity: Arc<dyn IdentityResolver>,
        default_repo: Arc<dyn DefaultRepoResolver>,
        store: Arc<dyn ThreadStore>,
    ) -> Self {
        Self {
            identity,
            default_repo,
            store,
        }
    }

    pub async fn deliver(
        &self,
        title: &str,
        body: &str,
        options: &DeliveryOptions,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        self.deliver_at(title, body, options, Utc::now()).await
    }

    /// Delivers `body` evaluating staleness against `now`.
    #[tracing::instrument(
        name = "herald_issues.delivery.deliver",
        skip(self, title, body, options),
        fields(update_after_days = options.update_after_days)
    )]
    pub async fn deliver_at(
        &self,
        title: &str,
        body: &str,
        options: &DeliveryOptions,
        now: DateTime<Utc>,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        validate_delivery_input(title, body, options)?;
        let repo = self.resolve_repo(options).await?;
        let identity = self.identity.authenticated_identity().await?;

        let message = substitute_placeholders(body, &identity);
        let fingerprint = compute_fingerprint(&message);

        let threads = self
            .store
            .list_open_threads(&ThreadQuery {
                owner: repo.owner.clone(),
                repo: repo.name.clone(),
                creator: identity.creator.clone(),
                per_page: THREAD_LIST_PAGE_SIZE,
            })
            .await?;
        tracing::debug!(
            repo = %repo,
            creator = %identity.creator,
            candidates = threads.len(),
            fingerprint = %fingerprint,
            "listed candidate threads"
        );

        let matched = threads.iter().find(|thread| {
            thread
                .body
                .as_deref()
                .is_some_and(|body| body_has_fingerprint_marker(body, &fingerprint))
        });

        if let Some(thread) = matched {
            let decision = evaluate_update_policy(
                &options.update,
                thread.locked,
                &thread.updated_at,
                options.update_after_days,
                now,
            );
            let mut note_id = None;
            if decision.post {
                let note = self
                    .store
                    .create_note(&NewNote {
                        owner: repo.owner.clone(),
                        repo: repo.name.clone(),
                        thread_number: thread.number,
                        body: substitute_placeholders(&options.update, &identity),
                    })
                    .await?;
                note_id = Some(note.id);
            }
            tracing::info!(
                repo = %repo,
                thread = thread.number,
                note_id = ?note_id,
                reason_code = decision.reason_code,
                "reused existing thread"
            );
            return Ok(DeliveryReceipt {
                owner: repo.owner,
                repo: repo.name,
                thread_number: thread.number,
                note_id,
                is_new: false,
                html_url: thread.html_url.clone(),
            });
        }

        let created = self
            .store
            .create_thread(&NewThread {
                owner: repo.owner.clone(),
                repo: repo.name.clone(),
                title: substitute_placeholders(title, &identity),
                body: append_fingerprint_marker(&message, &fingerprint),
            })
            .await?;
        tracing::info!(repo = %repo, thread = created.number, "created thread");
        Ok(DeliveryReceipt {
            owner: repo.owner,
            repo: repo.name,
            thread_number: created.number,
            note_id: None,
            is_new: true,
            html_url: created.html_url,
        })
    }

    async fn resolve_repo(&self, options: &DeliveryOptions) -> Result<RepoRef, DeliveryError> {
        if let Some(repo) = options.explicit_repo() {
            return Ok(repo);
        }
        let repo = self.default_repo.default_repo().await?;
        if repo.owner.trim().is_empty() || repo.name.trim().is_empty() {
            return Err(DeliveryError::InvalidInput(
                "default repository is missing an owner or name".to_string(),
            ));
        }
        Ok(repo)
    }
}

fn validate_delivery_input(
    title: &str,
    body: &str,
    options: &DeliveryOptions,
) -> Result<(), DeliveryError> {
    if title.is_empty() {
        return Err(DeliveryError::InvalidInput("title is required".to_string()));
    }
    if body.is_empty() {
        return Err(DeliveryError::InvalidInput("body is required".to_string()));
    }
    if !options.update_after_days.is_finite() || options.update_after_days < 0.0 {
        return Err(DeliveryError::InvalidInput(format!(
            "update_after_days must be a non-negative number, got {}",
            options.update_after_days
        )));
    }
    Ok(())
}

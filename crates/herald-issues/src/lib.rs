//! Content-addressed notification delivery over issue trackers.
//! This crate provides message fingerprinting, placeholder substitution, the
//! follow-up note policy, collaborator traits, and the delivery engine that
//! reuses an open thread instead of opening duplicates.

pub mod collaborators;
pub mod delivery;
pub mod fingerprint;
pub mod github_transport_helpers;
pub mod placeholder;
pub mod thread;
pub mod update_policy;

pub use collaborators::{DefaultRepoResolver, IdentityResolver, ThreadStore};
pub use delivery::{DeliveryEngine, DeliveryError, DeliveryOptions, DeliveryReceipt};
pub use fingerprint::{
    append_fingerprint_marker, body_has_fingerprint_marker, compute_fingerprint,
    extract_fingerprint_markers, render_fingerprint_marker,
};
pub use placeholder::substitute_placeholders;
pub use thread::{
    AuthenticatedIdentity, CreatedNote, CreatedThread, IssueThread, NewNote, NewThread, RepoRef,
    ThreadQuery, THREAD_LIST_PAGE_SIZE,
};
pub use update_policy::{evaluate_update_policy, UpdateDecision, DEFAULT_UPDATE_AFTER_DAYS};

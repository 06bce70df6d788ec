//! Runtime collaborators for Herald issue deliveries.
//!
//! Provides the reqwest-based GitHub REST client implementing identity
//! resolution and the thread store, plus repository-context resolvers for
//! environment variables and webhook event payloads.

pub mod github_issues_runtime;

pub use github_issues_runtime::*;

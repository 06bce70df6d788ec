use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use herald_issues::DEFAULT_UPDATE_AFTER_DAYS;
use herald_issues_runtime::DEFAULT_GITHUB_API_BASE;

use crate::{CliIdentityMode, CliShellCompletion};

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_non_negative_f64(value: &str) -> Result<f64, String> {
    let parsed = value
        .parse::<f64>()
        .map_err(|error| format!("failed to parse number: {error}"))?;
    if !parsed.is_finite() || parsed < 0.0 {
        return Err("value must be a finite number greater than or equal to 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "herald",
    about = "Post idempotent issue notifications that reuse existing threads",
    version
)]
pub struct Cli {
    #[arg(
        long = "github-token",
        env = "GITHUB_TOKEN",
        hide_env_values = true,
        global = true,
        help = "GitHub token used for issue and comment API access"
    )]
    pub github_token: Option<String>,

    #[arg(
        long = "github-app-token",
        env = "HERALD_GITHUB_APP_TOKEN",
        hide_env_values = true,
        global = true,
        help = "GitHub App JWT used only to resolve the app identity with --identity-mode app"
    )]
    pub github_app_token: Option<String>,

    #[arg(
        long = "github-api-base",
        env = "HERALD_GITHUB_API_BASE",
        default_value = DEFAULT_GITHUB_API_BASE,
        global = true,
        help = "GitHub API base URL"
    )]
    pub github_api_base: String,

    #[arg(
        long = "identity-mode",
        env = "HERALD_IDENTITY_MODE",
        value_enum,
        default_value = "viewer",
        global = true,
        help = "How the posting identity is resolved: app (GET /app), viewer (GET /user), static (--app-* flags)"
    )]
    pub identity_mode: CliIdentityMode,

    #[arg(
        long = "app-name",
        env = "HERALD_APP_NAME",
        global = true,
        help = "Identity display name for --identity-mode static and offline fingerprinting"
    )]
    pub app_name: Option<String>,

    #[arg(
        long = "app-url",
        env = "HERALD_APP_URL",
        global = true,
        help = "Identity URL for --identity-mode static and offline fingerprinting"
    )]
    pub app_url: Option<String>,

    #[arg(
        long = "app-creator",
        env = "HERALD_APP_CREATOR",
        global = true,
        help = "Creator filter for --identity-mode static (for example app/my-app); defaults to --app-name"
    )]
    pub app_creator: Option<String>,

    #[arg(
        long = "github-repo",
        env = "HERALD_GITHUB_REPO",
        global = true,
        help = "Default repository in owner/repo format when a delivery names none"
    )]
    pub github_repo: Option<String>,

    #[arg(
        long = "event-path",
        env = "GITHUB_EVENT_PATH",
        global = true,
        help = "Webhook event payload used to infer the default repository"
    )]
    pub event_path: Option<PathBuf>,

    #[arg(
        long = "request-timeout-ms",
        env = "HERALD_REQUEST_TIMEOUT_MS",
        default_value_t = 30_000,
        global = true,
        help = "Per-request timeout for GitHub API calls in milliseconds"
    )]
    pub request_timeout_ms: u64,

    #[arg(
        long = "retry-max-attempts",
        env = "HERALD_RETRY_MAX_ATTEMPTS",
        default_value_t = 3,
        value_parser = parse_positive_usize,
        global = true,
        help = "Maximum attempts per GitHub API request, including the first"
    )]
    pub retry_max_attempts: usize,

    #[arg(
        long = "retry-base-delay-ms",
        env = "HERALD_RETRY_BASE_DELAY_MS",
        default_value_t = 500,
        global = true,
        help = "Base exponential backoff delay in milliseconds for retried GitHub API requests"
    )]
    pub retry_base_delay_ms: u64,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Open a thread for the message, or reuse the open thread already carrying it
    Send(SendArgs),
    /// Print the fingerprint and marker a message body would carry
    Fingerprint(FingerprintArgs),
    /// Print a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: CliShellCompletion,
    },
}

#[derive(Debug, Clone, Args)]
pub struct SendArgs {
    #[arg(long, help = "Thread title; {appName} and {appUrl} are substituted once each")]
    pub title: String,

    #[arg(
        long,
        conflicts_with = "body_file",
        required_unless_present = "body_file",
        help = "Message body; its fingerprint decides which thread is reused"
    )]
    pub body: Option<String>,

    #[arg(long = "body-file", help = "Read the message body from a file")]
    pub body_file: Option<PathBuf>,

    #[arg(
        long,
        conflicts_with = "update_file",
        help = "Follow-up note posted on a reused thread once it is stale"
    )]
    pub update: Option<String>,

    #[arg(long = "update-file", help = "Read the follow-up note from a file")]
    pub update_file: Option<PathBuf>,

    #[arg(
        long = "update-after-days",
        default_value_t = DEFAULT_UPDATE_AFTER_DAYS,
        value_parser = parse_non_negative_f64,
        help = "Days without thread activity before a follow-up note is posted"
    )]
    pub update_after_days: f64,

    #[arg(long, help = "Repository owner override; only used together with --repo")]
    pub owner: Option<String>,

    #[arg(long, help = "Repository name override; only used together with --owner")]
    pub repo: Option<String>,

    #[arg(long, default_value_t = false, help = "Emit the delivery receipt as pretty JSON")]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct FingerprintArgs {
    #[arg(
        long,
        conflicts_with = "body_file",
        required_unless_present = "body_file",
        help = "Message body to fingerprint"
    )]
    pub body: Option<String>,

    #[arg(long = "body-file", help = "Read the message body from a file")]
    pub body_file: Option<PathBuf>,

    #[arg(
        long = "scan-file",
        help = "Thread body file to check for the marker and list the markers it carries"
    )]
    pub scan_file: Option<PathBuf>,

    #[arg(long, default_value_t = false, help = "Emit the report as pretty JSON")]
    pub json: bool,
}

use anyhow::{Context, Result};
use herald_issues::{
    body_has_fingerprint_marker, compute_fingerprint, extract_fingerprint_markers,
    render_fingerprint_marker, substitute_placeholders, AuthenticatedIdentity, DeliveryEngine,
    DeliveryOptions, DeliveryReceipt,
};
use serde::Serialize;

use crate::message_source::resolve_message_text;
use crate::runtime_config::build_delivery_engine;
use crate::shell_completion::render_shell_completion;
use crate::{Cli, CliCommand, FingerprintArgs, SendArgs};

/// Runs one CLI invocation and returns the text to print on stdout.
pub async fn execute_cli(cli: Cli) -> Result<String> {
    match &cli.command {
        CliCommand::Send(args) => {
            let engine = build_delivery_engine(&cli)?;
            execute_send(&engine, args).await
        }
        CliCommand::Fingerprint(args) => execute_fingerprint(&cli, args),
        CliCommand::Completions { shell } => Ok(render_shell_completion(*shell)),
    }
}

pub async fn execute_send(engine: &DeliveryEngine, args: &SendArgs) -> Result<String> {
    let body = resolve_message_text("body", args.body.as_deref(), args.body_file.as_deref())?
        .unwrap_or_default();
    let update =
        resolve_message_text("update", args.update.as_deref(), args.update_file.as_deref())?
            .unwrap_or_default();
    if args.owner.is_some() != args.repo.is_some() {
        tracing::warn!("--owner and --repo must be given together; using the default repository");
    }
    let options = DeliveryOptions {
        update,
        update_after_days: args.update_after_days,
        owner: args.owner.clone(),
        repo: args.repo.clone(),
    };
    let receipt = engine.deliver(&args.title, &body, &options).await?;
    if args.json {
        return serde_json::to_string_pretty(&receipt).context("failed to render receipt json");
    }
    Ok(render_receipt_summary(&receipt))
}

pub fn render_receipt_summary(receipt: &DeliveryReceipt) -> String {
    let target = format!(
        "{}/{}#{}",
        receipt.owner, receipt.repo, receipt.thread_number
    );
    let summary = if receipt.is_new {
        format!("created thread {target}")
    } else {
        match receipt.note_id {
            Some(note_id) => format!("reused thread {target} (posted note {note_id})"),
            None => format!("reused thread {target} (no note posted)"),
        }
    };
    match receipt.html_url.as_deref() {
        Some(url) => format!("{summary}\n{url}"),
        None => summary,
    }
}

#[derive(Debug, Serialize)]
struct FingerprintReport {
    fingerprint: String,
    marker: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scan: Option<FingerprintScan>,
}

#[derive(Debug, Serialize)]
struct FingerprintScan {
    path: String,
    matches: bool,
    markers: Vec<String>,
}

/// Fingerprints a body offline, substituting `--app-name`/`--app-url` when given.
pub fn execute_fingerprint(cli: &Cli, args: &FingerprintArgs) -> Result<String> {
    let body = resolve_message_text("body", args.body.as_deref(), args.body_file.as_deref())?
        .unwrap_or_default();
    let identity = AuthenticatedIdentity {
        name: cli.app_name.clone().unwrap_or_else(|| "{appName}".to_string()),
        url: cli.app_url.clone().unwrap_or_else(|| "{appUrl}".to_string()),
        creator: String::new(),
    };
    let fingerprint = compute_fingerprint(&substitute_placeholders(&body, &identity));
    let scan = match args.scan_file.as_ref() {
        Some(path) => {
            let thread_body = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read scan file {}", path.display()))?;
            Some(FingerprintScan {
                path: path.display().to_string(),
                matches: body_has_fingerprint_marker(&thread_body, &fingerprint),
                markers: extract_fingerprint_markers(&thread_body),
            })
        }
        None => None,
    };
    let report = FingerprintReport {
        marker: render_fingerprint_marker(&fingerprint),
        fingerprint,
        scan,
    };
    if args.json {
        return serde_json::to_string_pretty(&report).context("failed to render fingerprint json");
    }

    let mut lines = vec![
        format!("fingerprint: {}", report.fingerprint),
        format!("marker: {}", report.marker),
    ];
    if let Some(scan) = &report.scan {
        lines.push(format!(
            "scan: {} matches={} markers={}",
            scan.path,
            scan.matches,
            scan.markers.len()
        ));
        lines.extend(scan.markers.iter().map(|marker| format!("  - {marker}")));
    }
    Ok(lines.join("\n"))
}

use std::path::Path;

use anyhow::{bail, Context, Result};

/// Resolves a message template given inline or as a file path.
///
/// File contents are used verbatim apart from one trailing newline, which
/// editors add and which would otherwise change the fingerprint.
pub fn resolve_message_text(
    label: &str,
    inline: Option<&str>,
    file: Option<&Path>,
) -> Result<Option<String>> {
    match (inline, file) {
        (Some(_), Some(_)) => bail!("--{label} and --{label}-file are mutually exclusive"),
        (Some(text), None) => Ok(Some(text.to_string())),
        (None, Some(path)) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {label} file {}", path.display()))?;
            let text = raw
                .strip_suffix("\r\n")
                .or_else(|| raw.strip_suffix('\n'))
                .unwrap_or(&raw);
            Ok(Some(text.to_string()))
        }
        (None, None) => Ok(None),
    }
}

use sha2::{Digest, Sha256};

pub const FINGERPRINT_MARKER_PREFIX: &str = "<!--";
pub const FINGERPRINT_MARKER_SUFFIX: &str = "-->";
pub const FINGERPRINT_HEX_LEN: usize = 64;

/// Computes the lowercase hex SHA-256 digest used to address a message body.
pub fn compute_fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(FINGERPRINT_HEX_LEN);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}

pub fn render_fingerprint_marker(fingerprint: &str) -> String {
    format!("{FINGERPRINT_MARKER_PREFIX}{fingerprint}{FINGERPRINT_MARKER_SUFFIX}")
}

/// Returns true when `body` contains the exact marker for `fingerprint`.
///
/// Text around the marker is ignored, so a thread whose body was later edited
/// by other actors still matches as long as the marker survives.
pub fn body_has_fingerprint_marker(body: &str, fingerprint: &str) -> bool {
    body.contains(&render_fingerprint_marker(fingerprint))
}

pub fn append_fingerprint_marker(body: &str, fingerprint: &str) -> String {
    format!("{body}\n{}", render_fingerprint_marker(fingerprint))
}

/// Collects every well-formed fingerprint marker in `text`, in order of appearance.
pub fn extract_fingerprint_markers(text: &str) -> Vec<String> {
    let mut fingerprints = Vec::new();
    let mut cursor = text;
    while let Some(start) = cursor.find(FINGERPRINT_MARKER_PREFIX) {
        let after_start = &cursor[start + FINGERPRINT_MARKER_PREFIX.len()..];
        let Some(end) = after_start.find(FINGERPRINT_MARKER_SUFFIX) else {
            break;
        };
        let candidate = &after_start[..end];
        if is_fingerprint(candidate) {
            fingerprints.push(candidate.to_string());
            cursor = &after_start[end + FINGERPRINT_MARKER_SUFFIX.len()..];
        } else {
            // Not ours (an ordinary HTML comment); resume right after its opener.
            cursor = after_start;
        }
    }
    fingerprints
}

fn is_fingerprint(candidate: &str) -> bool {
    candidate.len() == FINGERPRINT_HEX_LEN
        && candidate
            .chars()
            .all(|ch| ch.is_ascii_digit() || ('a'..='f').contains(&ch))
}

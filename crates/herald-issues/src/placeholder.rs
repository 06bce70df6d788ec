use crate::thread::AuthenticatedIdentity;

pub const APP_NAME_PLACEHOLDER: &str = "{appName}";
pub const APP_URL_PLACEHOLDER: &str = "{appUrl}";

/// Replaces the first `{appName}` and then the first `{appUrl}` in `template`.
///
/// Repeated placeholders past the first occurrence are left literal.
pub fn substitute_placeholders(template: &str, identity: &AuthenticatedIdentity) -> String {
    template
        .replacen(APP_NAME_PLACEHOLDER, &identity.name, 1)
        .replacen(APP_URL_PLACEHOLDER, &identity.url, 1)
}

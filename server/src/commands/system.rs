// System Commands
// Host platform details and link validation

use url::Url;

use super::CommandError;

const ALLOWED_LINK_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

/// Platform name in the form the UI expects
pub fn get_platform() -> &'static str {
    platform_name(std::env::consts::OS)
}

pub fn platform_name(os: &str) -> &'static str {
    match os {
        "windows" => "Windows",
        "macos" => "MacOS",
        "linux" => "Linux",
        _ => "unknown",
    }
}

/// Only web and mail links may leave the sandbox; `file:`, custom schemes and
/// relative paths are rejected.
pub fn validate_external_url(raw: &str) -> Result<Url, CommandError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| CommandError::InvalidArgument(format!("url: {e}")))?;

    if !ALLOWED_LINK_SCHEMES.contains(&url.scheme()) {
        return Err(CommandError::Forbidden(format!(
            "links with scheme '{}' cannot be opened",
            url.scheme()
        )));
    }

    Ok(url)
}

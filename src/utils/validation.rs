use crate::utils::error::{Result, SyncError};
use std::path::{is_separator, Path};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: impl ToString, reason: impl Into<String>) -> SyncError {
    SyncError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// API endpoints get request paths appended, so query strings and fragments
/// are rejected along with non-HTTP schemes.
pub fn validate_base_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.trim().is_empty() {
        return Err(invalid(field_name, url_str, "URL cannot be empty"));
    }

    let url = Url::parse(url_str)
        .map_err(|e| invalid(field_name, url_str, format!("Invalid URL format: {}", e)))?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(invalid(
                field_name,
                url_str,
                format!("Unsupported URL scheme: {}", scheme),
            ))
        }
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid(
            field_name,
            url_str,
            "URL must not carry a query string or fragment",
        ));
    }
    Ok(())
}

/// The credentials path must name a file, and every `${VAR}` in it must have
/// been resolved from the environment.
pub fn validate_credentials_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }
    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }
    if path.contains("${") {
        return Err(invalid(
            field_name,
            path,
            "Path references an environment variable that is not set",
        ));
    }
    if path.ends_with(is_separator) || Path::new(path).file_name().is_none() {
        return Err(invalid(field_name, path, "Path must name a file, not a directory"));
    }
    Ok(())
}

/// Sent verbatim as the `User-Agent` header.
pub fn validate_user_agent(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(
            field_name,
            value,
            "Value cannot be empty or whitespace-only",
        ));
    }
    if value.chars().any(char::is_control) {
        return Err(invalid(field_name, value, "Value contains control characters"));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_base_url() {
        assert!(validate_base_url("api.base_url", "https://oauth.reddit.com").is_ok());
        assert!(validate_base_url("api.base_url", "http://127.0.0.1:8080/").is_ok());
        assert!(validate_base_url("api.base_url", "").is_err());
        assert!(validate_base_url("api.base_url", "invalid-url").is_err());
        assert!(validate_base_url("api.base_url", "ftp://example.com").is_err());
        assert!(validate_base_url("api.base_url", "https://oauth.reddit.com?raw_json=1").is_err());
        assert!(validate_base_url("api.site_url", "https://reddit.com/#top").is_err());
    }

    #[test]
    fn test_validate_credentials_path() {
        let field = "storage.credentials_path";
        assert!(validate_credentials_path(field, "./.redalt-sync/credentials.json").is_ok());
        assert!(validate_credentials_path(field, "tokens.json").is_ok());
        assert!(validate_credentials_path(field, "  ").is_err());
        assert!(validate_credentials_path(field, "bad\0path").is_err());
        assert!(validate_credentials_path(field, "./.redalt-sync/").is_err());
        assert!(validate_credentials_path(field, "..").is_err());

        let err = validate_credentials_path(field, "${REDALT_UNSET_HOME}/c.json").unwrap_err();
        assert!(err.to_string().contains("storage.credentials_path"));
    }

    #[test]
    fn test_validate_user_agent() {
        assert!(validate_user_agent("api.user_agent", "RedAltSync/1.0").is_ok());
        assert!(validate_user_agent("api.user_agent", "   ").is_err());
        assert!(validate_user_agent("api.user_agent", "RedAltSync\r\nX-Evil: 1").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("api.page_size", 100, 1, 100).is_ok());
        assert!(validate_range("api.page_size", 0, 1, 100).is_err());
        assert!(validate_range("api.page_size", 101, 1, 100).is_err());
    }
}

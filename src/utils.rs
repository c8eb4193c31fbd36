use std::time::Duration;
use url::Url;

/// Parse `url` and accept only web schemes.
///
/// Rejecting everything else up front means `file://` or `chrome://` targets
/// never reach a browser.
pub fn validate_url(url: &str) -> Result<Url, UrlRejection> {
    let parsed = Url::parse(url).map_err(UrlRejection::Parse)?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(UrlRejection::Scheme(scheme.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UrlRejection {
    #[error("{0}")]
    Parse(url::ParseError),

    #[error("unsupported scheme `{0}`")]
    Scheme(String),
}

pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    let millis = duration.subsec_millis();

    if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else if seconds > 0 {
        format!("{}.{}s", seconds, millis / 100)
    } else {
        format!("{millis}ms")
    }
}

pub fn format_bytes(bytes: usize) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_secs(5)), "5.0s");
        assert_eq!(format_duration(Duration::from_millis(2750)), "2.7s");
        assert_eq!(format_duration(Duration::from_secs(180)), "3m 0s");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1048576), "1.00 MB");
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com").is_ok());
        assert!(validate_url("http://example.com/path?query=value").is_ok());
        assert!(matches!(validate_url("not-a-url"), Err(UrlRejection::Parse(_))));
        assert!(matches!(validate_url(""), Err(UrlRejection::Parse(_))));
        assert_eq!(
            validate_url("file:///etc/passwd"),
            Err(UrlRejection::Scheme("file".to_string()))
        );
        assert!(validate_url("ftp://example.com").is_err());
    }
}

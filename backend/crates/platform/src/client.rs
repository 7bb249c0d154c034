//! Client identification utilities
//!
//! Common functions for identifying clients via HTTP headers.

use axum::http::HeaderMap;

/// Header set by the edge proxy with the originating client address
pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// Identity used when the proxy did not report a client address
pub const DEFAULT_CLIENT_ID: &str = "127.0.0.1";

/// Extract the client identity from request headers
///
/// Uses the first entry of `X-Forwarded-For` (the original client when the
/// request crossed several proxies). The value is kept as a plain string and
/// is not required to parse as an IP address.
///
/// ## Arguments
/// * `headers` - HTTP request headers
///
/// ## Returns
/// The client identity, or [`DEFAULT_CLIENT_ID`] if the header is missing,
/// empty or not valid ASCII
pub fn extract_client_id(headers: &HeaderMap) -> String {
    headers
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|xff| xff.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty())
        .unwrap_or(DEFAULT_CLIENT_ID)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_client_id_single() {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR, HeaderValue::from_static("1.2.3.4"));

        assert_eq!(extract_client_id(&headers), "1.2.3.4");
    }

    #[test]
    fn test_extract_client_id_multi_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            FORWARDED_FOR,
            HeaderValue::from_static("192.168.1.1, 10.0.0.1"),
        );

        assert_eq!(extract_client_id(&headers), "192.168.1.1");
    }

    #[test]
    fn test_extract_client_id_missing() {
        let headers = HeaderMap::new();
        assert_eq!(extract_client_id(&headers), DEFAULT_CLIENT_ID);
    }

    #[test]
    fn test_extract_client_id_blank() {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR, HeaderValue::from_static(" , 10.0.0.1"));

        assert_eq!(extract_client_id(&headers), DEFAULT_CLIENT_ID);
    }

    #[test]
    fn test_extract_client_id_not_an_ip() {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR, HeaderValue::from_static("unknown"));

        assert_eq!(extract_client_id(&headers), "unknown");
    }
}

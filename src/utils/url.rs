//! URL utilities for consistent URL handling
//!
//! Normalizes base URLs so endpoint construction never produces double
//! slashes regardless of how the configured base URL is written.

/// Normalize a base URL by removing trailing slashes.
///
/// # Examples
///
/// ```
/// use chatgrid::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:8000/api"), "http://localhost:8000/api");
/// assert_eq!(normalize_base_url("http://localhost:8000/api/"), "http://localhost:8000/api");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Construct a complete endpoint URL from a base URL and endpoint path.
///
/// # Examples
///
/// ```
/// use chatgrid::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:8000/api/", "/chats"),
///     "http://localhost:8000/api/chats"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}

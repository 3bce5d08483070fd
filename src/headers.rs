use crate::transport::HttpRequest;

/// Common Chrome user agent string for page scrapes
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Add headers for JSON API requests
pub fn with_json_headers(request: HttpRequest) -> HttpRequest {
    request
        .with_header("User-Agent", USER_AGENT)
        .with_header("Accept", "application/json")
        .with_header("Accept-Language", "en-US,en;q=0.9")
}

/// Add headers for regular page requests (scrapes)
pub fn with_page_headers(request: HttpRequest) -> HttpRequest {
    request
        .with_header("User-Agent", USER_AGENT)
        .with_header(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        )
        .with_header("Accept-Language", "en-US,en;q=0.9")
        .with_header("DNT", "1")
        .with_header("Upgrade-Insecure-Requests", "1")
}

/// Add a bearer token
pub fn with_bearer(request: HttpRequest, token: &str) -> HttpRequest {
    request.with_header("Authorization", &format!("Bearer {token}"))
}

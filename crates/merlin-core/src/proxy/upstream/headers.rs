//! Browser-emulation headers for vendor requests.
//!
//! The vendor's web endpoints only answer requests that look like they came
//! from its own web client: Chrome client hints, fetch metadata, origin and
//! referer of the web app, plus the `x-merlin-version` marker.

use merlin_types::models::UpstreamEndpoints;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, CACHE_CONTROL,
    CONTENT_TYPE, COOKIE, ORIGIN, PRAGMA, REFERER, USER_AGENT,
};

use crate::proxy::common::header_constants::{
    EVENT_STREAM, MERLIN_VERSION_WEB, SESSION_COOKIE_NAME, X_MERLIN_VERSION,
};

const SEC_CH_UA: &str = r#""Not_A Brand";v="8", "Chromium";v="120", "Google Chrome";v="120""#;
const ACCEPT_JSON: &str = "application/json, text/plain, */*";
const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.9";

fn insert(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(v) => {
            headers.insert(name, v);
        },
        Err(_) => tracing::warn!("Dropping header {} with non-visible characters", name),
    }
}

/// Headers common to every vendor request.
pub fn browser_headers(endpoints: &UpstreamEndpoints) -> HeaderMap {
    let mut headers = HeaderMap::new();
    insert(&mut headers, ORIGIN, &endpoints.origin);
    insert(&mut headers, REFERER, &endpoints.referer);
    insert(&mut headers, USER_AGENT, &endpoints.user_agent);
    insert(&mut headers, ACCEPT_LANGUAGE, ACCEPT_LANGUAGE_VALUE);
    insert(&mut headers, HeaderName::from_static(X_MERLIN_VERSION), MERLIN_VERSION_WEB);
    insert(&mut headers, HeaderName::from_static("sec-ch-ua"), SEC_CH_UA);
    insert(&mut headers, HeaderName::from_static("sec-ch-ua-mobile"), "?0");
    insert(&mut headers, HeaderName::from_static("sec-ch-ua-platform"), r#""macOS""#);
    insert(&mut headers, HeaderName::from_static("sec-fetch-dest"), "empty");
    insert(&mut headers, HeaderName::from_static("sec-fetch-mode"), "cors");
    insert(&mut headers, HeaderName::from_static("sec-fetch-site"), "same-site");
    headers
}

/// Headers for a chat or image stream request.
pub fn stream_headers(endpoints: &UpstreamEndpoints, bearer: &str) -> HeaderMap {
    let mut headers = browser_headers(endpoints);
    insert(&mut headers, CONTENT_TYPE, "application/json");
    insert(&mut headers, ACCEPT, EVENT_STREAM);
    insert(&mut headers, AUTHORIZATION, bearer);
    headers
}

/// Headers for the session-cookie exchange.
pub fn session_headers(endpoints: &UpstreamEndpoints, session_token: &str) -> HeaderMap {
    let mut headers = browser_headers(endpoints);
    insert(&mut headers, ACCEPT, ACCEPT_JSON);
    insert(&mut headers, CACHE_CONTROL, "no-cache");
    insert(&mut headers, PRAGMA, "no-cache");
    insert(&mut headers, COOKIE, &format!("{}={}", SESSION_COOKIE_NAME, session_token));
    headers
}

/// Headers for the refresh-token exchange. The refresh token is sent raw.
pub fn refresh_headers(endpoints: &UpstreamEndpoints, refresh_token: &str) -> HeaderMap {
    let mut headers = browser_headers(endpoints);
    insert(&mut headers, CONTENT_TYPE, "application/json");
    insert(&mut headers, ACCEPT, ACCEPT_JSON);
    insert(&mut headers, HeaderName::from_static("x-merlin-client-type"), "web");
    insert(&mut headers, HeaderName::from_static("x-merlin-client-version"), "1.0.0");
    insert(&mut headers, AUTHORIZATION, refresh_token);
    headers
}

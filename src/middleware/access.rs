use std::collections::BTreeMap;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::{debug, warn};

use scanlearn_auth::{CookieDirective, GateRequest, RequestCookies, SameSitePolicy};
use scanlearn_core::AppError;
use scanlearn_observability::{track_gate_decision, track_session_refresh};

use crate::state::AppState;

/// Paths under `/api/` the gate never sees.
const EXCLUDED_PREFIXES: &[&str] = &["auth", "_next/static", "_next/image", "favicon.ico"];

/// Whether the gate runs for `path`: everything under `/api/` except the
/// auth endpoints, framework assets and the favicon.
pub fn is_gated_path(path: &str) -> bool {
    let Some(rest) = path.strip_prefix("/api/") else {
        return false;
    };

    !EXCLUDED_PREFIXES.iter().any(|prefix| {
        rest.strip_prefix(prefix)
            .is_some_and(|tail| tail.is_empty() || tail.starts_with('/'))
    })
}

/// Axum middleware running [`scanlearn_auth::AccessGate`] in front of handlers.
///
/// # Usage
///
/// ```rust,ignore
/// let app = Router::new()
///     .nest("/api", api_routes)
///     .layer(middleware::from_fn_with_state(state.clone(), access_gate))
///     .with_state(state);
/// ```
pub async fn access_gate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    if !is_gated_path(req.uri().path()) {
        return next.run(req).await;
    }

    let cookies = request_cookies(req.headers());
    let gate_request = GateRequest {
        path: req.uri().path().to_string(),
        method: req.method().clone(),
        cookies,
    };

    let decision = state.gate.evaluate(&gate_request).await;
    if decision.is_refreshed() {
        track_session_refresh();
    }

    let Some(denial) = decision.denial() else {
        track_gate_decision("allow", "none");
        write_request_cookies(req.headers_mut(), gate_request.cookies, &decision.cookies);
        let mut response = next.run(req).await;
        append_set_cookies(response.headers_mut(), &decision.cookies);
        return response;
    };

    warn!(
        method = %gate_request.method,
        path = %gate_request.path,
        reason = denial.label(),
        "Request rejected by access gate"
    );
    track_gate_decision("deny", denial.label());

    let mut response = AppError::with_message(denial.status_code(), denial.reason()).into_response();
    append_set_cookies(response.headers_mut(), &decision.cookies);
    response
}

fn request_cookies(headers: &HeaderMap) -> RequestCookies {
    CookieJar::from_headers(headers)
        .iter()
        .map(|c| (c.name().to_string(), c.value().to_string()))
        .collect()
}

fn to_cookie(directive: &CookieDirective) -> Cookie<'static> {
    let attributes = &directive.attributes;
    let same_site = match attributes.same_site {
        SameSitePolicy::Strict => SameSite::Strict,
        SameSitePolicy::Lax => SameSite::Lax,
        SameSitePolicy::None => SameSite::None,
    };

    let mut builder = Cookie::build((directive.name.clone(), directive.value.clone()))
        .path(attributes.path.clone())
        .http_only(attributes.http_only)
        .secure(attributes.secure)
        .same_site(same_site);
    if let Some(seconds) = attributes.max_age {
        builder = builder.max_age(time::Duration::seconds(seconds));
    }

    builder.build()
}

/// Rewrites the inbound `Cookie` header so handlers see refreshed values.
fn write_request_cookies(
    headers: &mut HeaderMap,
    mut cookies: RequestCookies,
    directives: &[CookieDirective],
) {
    if directives.is_empty() {
        return;
    }

    for directive in directives {
        if directive.is_removal() {
            cookies.remove(&directive.name);
        } else {
            cookies.insert(directive.name.clone(), directive.value.clone());
        }
    }

    headers.remove(header::COOKIE);
    if cookies.is_empty() {
        return;
    }

    let value = join_cookie_header(&cookies);
    match HeaderValue::from_str(&value) {
        Ok(value) => {
            headers.insert(header::COOKIE, value);
        }
        Err(e) => debug!(error = %e, "refreshed cookie header is not a valid header value"),
    }
}

fn join_cookie_header(cookies: &BTreeMap<String, String>) -> String {
    cookies
        .iter()
        .map(|(name, value)| Cookie::new(name.as_str(), value.as_str()).stripped().to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn append_set_cookies(headers: &mut HeaderMap, directives: &[CookieDirective]) {
    for directive in directives {
        match HeaderValue::from_str(&to_cookie(directive).to_string()) {
            Ok(value) => {
                headers.append(header::SET_COOKIE, value);
            }
            Err(e) => warn!(cookie = %directive.name, error = %e, "Dropping unencodable cookie"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanlearn_auth::CookieAttributes;

    #[test]
    fn test_gated_paths() {
        assert!(is_gated_path("/api/scans"));
        assert!(is_gated_path("/api/quizzes/1/submit"));
        assert!(is_gated_path("/api/authors"));
        assert!(is_gated_path("/api/"));

        assert!(!is_gated_path("/api/auth"));
        assert!(!is_gated_path("/api/auth/login"));
        assert!(!is_gated_path("/api/_next/static/chunk.js"));
        assert!(!is_gated_path("/api/_next/image/logo.png"));
        assert!(!is_gated_path("/api/favicon.ico"));
        assert!(!is_gated_path("/api"));
        assert!(!is_gated_path("/health"));
    }

    #[test]
    fn test_to_cookie_attributes() {
        let cookie = to_cookie(&CookieDirective::set(
            "sl-access-token",
            "abc",
            CookieAttributes {
                max_age: Some(3600),
                ..CookieAttributes::default()
            },
        ));

        assert_eq!(cookie.name(), "sl-access-token");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(3600)));
    }

    #[test]
    fn test_write_request_cookies_applies_directives() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("a=1; b=2"));
        let cookies = request_cookies(&headers);

        write_request_cookies(
            &mut headers,
            cookies,
            &[
                CookieDirective::set("a", "fresh", CookieAttributes::default()),
                CookieDirective::remove("b", CookieAttributes::default()),
                CookieDirective::set("c", "3", CookieAttributes::default()),
            ],
        );

        assert_eq!(headers.get(header::COOKIE).unwrap(), "a=fresh; c=3");
    }

    #[test]
    fn test_write_request_cookies_drops_header_when_all_removed() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("a=1"));
        let cookies = request_cookies(&headers);

        write_request_cookies(
            &mut headers,
            cookies,
            &[CookieDirective::remove("a", CookieAttributes::default())],
        );

        assert!(headers.get(header::COOKIE).is_none());
    }

    #[test]
    fn test_append_set_cookies_keeps_order() {
        let mut headers = HeaderMap::new();
        append_set_cookies(
            &mut headers,
            &[
                CookieDirective::set("first", "1", CookieAttributes::default()),
                CookieDirective::remove("second", CookieAttributes::default()),
            ],
        );

        let values: Vec<&str> = headers
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(values.len(), 2);
        assert!(values[0].starts_with("first=1"));
        assert!(values[1].starts_with("second="));
        assert!(values[1].contains("Max-Age=0"));
    }
}

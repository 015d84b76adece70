//! Cross-origin access-control policy.
//!
//! Every inbound request passes through [`origin_middleware`] before routing.
//! The decision is: no `Origin` header → allow (same-host callers and tools
//! like curl), exact allowlist match → allow, pattern match → allow,
//! anything else → 403 with an explicit rejection body. Preflight `OPTIONS`
//! requests are answered here for every path with the same decision.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use regex::Regex;

use crate::api::ApiError;
use crate::server::Config;

/// Default development origin used when no origin is configured.
pub const DEFAULT_ORIGIN: &str = "http://localhost:5173";

/// Methods advertised on preflight responses.
pub const ALLOWED_METHODS: &str = "GET,HEAD,PUT,PATCH,POST,DELETE,OPTIONS";

/// Headers advertised on preflight responses.
pub const ALLOWED_HEADERS: &str = "Content-Type, Authorization";

/// Immutable origin policy, constructed once at startup and shared read-only
/// across request tasks.
#[derive(Debug)]
pub struct OriginPolicy {
    allowlist: Vec<String>,
    patterns: Vec<Regex>,
}

impl OriginPolicy {
    /// Build the policy from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.cors_origins,
            config.render_external_url.as_deref(),
            config.vercel_url.as_deref(),
            config.pattern_matching,
        )
    }

    /// Build the policy from an explicit origin list plus platform URL hints.
    ///
    /// Hints are appended without trailing slashes and without duplicates.
    /// The default development origin applies only when the resulting list
    /// would otherwise be empty.
    pub fn new(
        configured: &[String],
        render_url: Option<&str>,
        vercel_url: Option<&str>,
        patterns_enabled: bool,
    ) -> Self {
        let mut allowlist: Vec<String> = Vec::new();
        for origin in configured {
            let origin = origin.trim().trim_end_matches('/');
            if !origin.is_empty() && !allowlist.iter().any(|o| o == origin) {
                allowlist.push(origin.to_string());
            }
        }

        // e.g. miapp.vercel.app, sin esquema
        if let Some(host) = vercel_url.map(|v| v.trim_end_matches('/')).filter(|v| !v.is_empty()) {
            let origin = format!("https://{host}");
            if !allowlist.contains(&origin) {
                allowlist.push(origin);
            }
        }
        if let Some(url) = render_url.map(|v| v.trim_end_matches('/')).filter(|v| !v.is_empty()) {
            if !allowlist.iter().any(|o| o == url) {
                allowlist.push(url.to_string());
            }
        }

        if allowlist.is_empty() {
            allowlist.push(DEFAULT_ORIGIN.to_string());
        }

        let patterns = if patterns_enabled {
            default_patterns()
        } else {
            Vec::new()
        };

        Self { allowlist, patterns }
    }

    /// Decide whether a request with the given `Origin` header may receive a
    /// cross-origin response. Absence of the header is always allowed.
    pub fn allows(&self, origin: Option<&str>) -> bool {
        let Some(origin) = origin else {
            return true;
        };
        if self.allowlist.iter().any(|o| o == origin) {
            return true;
        }
        self.patterns.iter().any(|rx| rx.is_match(origin))
    }

    /// The exact-match allowlist (echoed by `/api/__ping`).
    pub fn allowlist(&self) -> &[String] {
        &self.allowlist
    }
}

// Patrones permitidos además de la lista explícita: cualquier puerto de
// localhost y cualquier subdominio de las dos plataformas de despliegue.
fn default_patterns() -> Vec<Regex> {
    [
        r"(?i)localhost:\d+$",
        r"(?i)^https?://([a-z0-9-]+\.)*vercel\.app$",
        r"(?i)^https?://([a-z0-9-]+\.)*onrender\.com$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("patrón de origen inválido"))
    .collect()
}

/// CORS gate middleware.
///
/// Applied outermost so the decision covers matched routes, the not-found
/// fallback and preflights alike.
pub async fn origin_middleware(
    State(policy): State<Arc<OriginPolicy>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    if !policy.allows(origin.as_deref()) {
        return ApiError::OriginDenied {
            origin: origin.unwrap_or_default(),
        }
        .into_response();
    }

    let Some(origin) = origin else {
        return next.run(request).await;
    };

    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        apply_cors_headers(response.headers_mut(), &origin);
        response.headers_mut().insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        response.headers_mut().insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        );
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut(), &origin);
    response
}

fn apply_cors_headers(headers: &mut HeaderMap, origin: &str) {
    if let Ok(value) = HeaderValue::from_str(origin) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(header::VARY, HeaderValue::from_static("Origin"));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(configured: &[&str], patterns: bool) -> OriginPolicy {
        let configured: Vec<String> = configured.iter().map(|s| s.to_string()).collect();
        OriginPolicy::new(&configured, None, None, patterns)
    }

    #[test]
    fn absent_origin_is_allowed() {
        assert!(policy(&[], true).allows(None));
        assert!(policy(&[], false).allows(None));
    }

    #[test]
    fn empty_config_falls_back_to_default_origin() {
        let p = policy(&[], false);
        assert_eq!(p.allowlist(), &[DEFAULT_ORIGIN.to_string()]);
        assert!(p.allows(Some(DEFAULT_ORIGIN)));
    }

    #[test]
    fn exact_match_against_allowlist() {
        let p = policy(&["https://inventario.example.com"], false);
        assert!(p.allows(Some("https://inventario.example.com")));
        assert!(!p.allows(Some("https://otro.example.com")));
    }

    #[test]
    fn localhost_any_port_matches_pattern() {
        let p = policy(&[], true);
        assert!(p.allows(Some("http://localhost:5174")));
        assert!(p.allows(Some("http://localhost:3000")));
        assert!(!policy(&[], false).allows(Some("http://localhost:5174")));
    }

    #[test]
    fn platform_subdomains_match_pattern() {
        let p = policy(&[], true);
        assert!(p.allows(Some("https://mi-app.vercel.app")));
        assert!(p.allows(Some("https://api-v2.onrender.com")));
        assert!(p.allows(Some("https://a.b.vercel.app")));
        assert!(!p.allows(Some("https://evil.example.com")));
    }

    #[test]
    fn pattern_suffix_cannot_be_spoofed() {
        let p = policy(&[], true);
        assert!(!p.allows(Some("https://vercel.app.evil.com")));
        assert!(!p.allows(Some("https://notonrender.com.attacker.net")));
    }

    #[test]
    fn platform_hints_are_appended_without_slashes_or_duplicates() {
        let configured = vec!["https://mi-app.vercel.app".to_string()];
        let p = OriginPolicy::new(
            &configured,
            Some("https://backend.onrender.com/"),
            Some("mi-app.vercel.app"),
            false,
        );
        assert_eq!(
            p.allowlist(),
            &[
                "https://mi-app.vercel.app".to_string(),
                "https://backend.onrender.com".to_string(),
            ]
        );
    }

    #[test]
    fn hints_alone_suppress_the_default_origin() {
        let p = OriginPolicy::new(&[], None, Some("mi-app.vercel.app"), false);
        assert_eq!(p.allowlist(), &["https://mi-app.vercel.app".to_string()]);
        assert!(!p.allows(Some(DEFAULT_ORIGIN)));
    }

    #[test]
    fn decision_ignores_request_method() {
        // allows() takes no method: the same decision applies to preflight
        // and actual requests by construction.
        let p = policy(&["https://inventario.example.com"], true);
        assert!(p.allows(Some("https://inventario.example.com")));
        assert!(!p.allows(Some("https://evil.example.com")));
    }
}

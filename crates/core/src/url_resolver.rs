//! Public base URL resolution.
//!
//! The retrieval URL is baked into the QR code at upload time and never
//! recomputed, so the base URL must be right on the first try. The strategy is
//! fixed at startup; precedence is static URL, then proxy headers, then
//! `http://localhost:<port>`.

use docdrop_shared::config::PublicUrlSettings;
use thiserror::Error;
use tracing::warn;
use url::Url;

/// URL construction errors.
#[derive(Debug, Error)]
pub enum UrlError {
    /// Configured base URL is not an absolute http(s) URL.
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBase {
        /// Offending value.
        url: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Base URL cannot carry path segments.
    #[error("base URL '{0}' cannot carry a path")]
    CannotBeABase(String),
}

impl UrlError {
    fn invalid_base(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidBase {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// Connection facts the resolver may use, gathered by the HTTP layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Scheme of the accepted connection, when known.
    pub scheme: Option<String>,
    /// `Host` header or URI authority.
    pub host: Option<String>,
    /// `X-Forwarded-Proto` header.
    pub forwarded_proto: Option<String>,
    /// `X-Forwarded-Host` header.
    pub forwarded_host: Option<String>,
}

/// How the public base URL is obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlResolutionStrategy {
    /// Fixed, configured URL.
    Static(Url),
    /// Derived from forwarded headers, then the connection itself.
    FromRequest {
        /// Used when the request carries no usable host.
        fallback: Url,
    },
    /// `http://localhost:<port>`.
    DefaultLocal(Url),
}

impl UrlResolutionStrategy {
    /// Pick the strategy for the loaded settings.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured static URL is malformed.
    pub fn from_settings(settings: &PublicUrlSettings, port: u16) -> Result<Self, UrlError> {
        match settings.base_url.as_deref().map(str::trim) {
            Some(base) if !base.is_empty() => Ok(Self::Static(parse_base(base)?)),
            _ if settings.trust_proxy_headers => Ok(Self::FromRequest {
                fallback: local_url(port)?,
            }),
            _ => Self::default_local(port),
        }
    }

    /// `http://localhost:<port>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the local URL cannot be parsed.
    pub fn default_local(port: u16) -> Result<Self, UrlError> {
        local_url(port).map(Self::DefaultLocal)
    }

    /// Strategy name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Static(_) => "static",
            Self::FromRequest { .. } => "from_request",
            Self::DefaultLocal(_) => "default_local",
        }
    }
}

/// Computes public URLs for the configured deployment.
#[derive(Debug, Clone)]
pub struct UrlResolver {
    strategy: UrlResolutionStrategy,
}

impl UrlResolver {
    /// Create a resolver for `strategy`.
    #[must_use]
    pub fn new(strategy: UrlResolutionStrategy) -> Self {
        Self { strategy }
    }

    /// Base URL clients should use to reach this service.
    #[must_use]
    pub fn resolve(&self, ctx: &RequestContext) -> Url {
        match &self.strategy {
            UrlResolutionStrategy::Static(url) | UrlResolutionStrategy::DefaultLocal(url) => {
                url.clone()
            }
            UrlResolutionStrategy::FromRequest { fallback } => {
                from_request(ctx).unwrap_or_else(|| fallback.clone())
            }
        }
    }

    /// `<base>/download/<key>`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base` cannot carry path segments.
    pub fn retrieval_url(&self, base: &Url, key: &str) -> Result<Url, UrlError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|()| UrlError::CannotBeABase(base.to_string()))?
            .pop_if_empty()
            .push("download")
            .push(key);
        Ok(url)
    }
}

fn local_url(port: u16) -> Result<Url, UrlError> {
    let raw = format!("http://localhost:{port}");
    Url::parse(&raw).map_err(|e| UrlError::invalid_base(raw, e.to_string()))
}

fn parse_base(raw: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(raw).map_err(|e| UrlError::invalid_base(raw, e.to_string()))?;
    if !is_http_scheme(url.scheme()) {
        return Err(UrlError::invalid_base(raw, "scheme must be http or https"));
    }
    if url.host().is_none() {
        return Err(UrlError::invalid_base(raw, "missing host"));
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn from_request(ctx: &RequestContext) -> Option<Url> {
    let host = first_value(ctx.forwarded_host.as_deref())
        .or_else(|| first_value(ctx.host.as_deref()))?;

    let scheme = first_value(ctx.forwarded_proto.as_deref())
        .filter(|s| is_http_scheme(s))
        .or_else(|| ctx.scheme.as_deref().filter(|s| is_http_scheme(s)))
        .unwrap_or("http")
        .to_ascii_lowercase();

    match Url::parse(&format!("{scheme}://{host}")) {
        Ok(url)
            if url.host().is_some()
                && url.path() == "/"
                && url.query().is_none()
                && url.username().is_empty() =>
        {
            Some(url)
        }
        _ => {
            warn!(host, "Ignoring unusable request host");
            None
        }
    }
}

/// First entry of a comma-separated header value.
fn first_value(value: Option<&str>) -> Option<&str> {
    value
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn is_http_scheme(scheme: &str) -> bool {
    scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ctx(
        host: Option<&str>,
        forwarded_proto: Option<&str>,
        forwarded_host: Option<&str>,
    ) -> RequestContext {
        RequestContext {
            scheme: None,
            host: host.map(String::from),
            forwarded_proto: forwarded_proto.map(String::from),
            forwarded_host: forwarded_host.map(String::from),
        }
    }

    fn settings(base_url: Option<&str>, trust_proxy_headers: bool) -> PublicUrlSettings {
        PublicUrlSettings {
            base_url: base_url.map(String::from),
            trust_proxy_headers,
        }
    }

    #[rstest]
    #[case(settings(Some("https://files.example.com"), true), "static")]
    #[case(settings(Some("https://files.example.com"), false), "static")]
    #[case(settings(Some("  "), true), "from_request")]
    #[case(settings(None, true), "from_request")]
    #[case(settings(None, false), "default_local")]
    fn test_strategy_precedence(#[case] settings: PublicUrlSettings, #[case] expected: &str) {
        let strategy =
            UrlResolutionStrategy::from_settings(&settings, 5000).expect("valid settings");
        assert_eq!(strategy.name(), expected);
    }

    #[rstest]
    #[case("not a url")]
    #[case("ftp://files.example.com")]
    #[case("mailto:someone@example.com")]
    fn test_malformed_static_url_rejected(#[case] raw: &str) {
        let result = UrlResolutionStrategy::from_settings(&settings(Some(raw), false), 5000);
        assert!(matches!(result, Err(UrlError::InvalidBase { .. })));
    }

    #[test]
    fn test_static_ignores_request() {
        let resolver = UrlResolver::new(
            UrlResolutionStrategy::from_settings(&settings(Some("https://files.example.com"), true), 5000)
                .expect("valid settings"),
        );
        let base = resolver.resolve(&ctx(Some("internal:5000"), Some("http"), Some("proxy.example.com")));
        assert_eq!(base.as_str(), "https://files.example.com/");
    }

    #[rstest]
    #[case(80, "http://localhost/")]
    #[case(5000, "http://localhost:5000/")]
    #[case(65535, "http://localhost:65535/")]
    fn test_local_url(#[case] port: u16, #[case] expected: &str) {
        let strategy = UrlResolutionStrategy::default_local(port).expect("local url");
        assert_eq!(strategy, UrlResolutionStrategy::DefaultLocal(Url::parse(expected).expect("url")));
    }

    #[test]
    fn test_default_local() {
        let resolver = UrlResolver::new(UrlResolutionStrategy::default_local(5000).expect("local url"));
        let base = resolver.resolve(&ctx(Some("example.com"), None, None));
        assert_eq!(base.as_str(), "http://localhost:5000/");
    }

    #[rstest]
    #[case(ctx(Some("10.0.0.5:5000"), Some("https"), Some("docs.example.com")), "https://docs.example.com/")]
    #[case(ctx(Some("10.0.0.5:5000"), Some("https, http"), Some("docs.example.com, lb.internal")), "https://docs.example.com/")]
    #[case(ctx(Some("docs.example.com:8443"), None, None), "http://docs.example.com:8443/")]
    #[case(ctx(Some("docs.example.com"), Some("gopher"), None), "http://docs.example.com/")]
    #[case(ctx(None, Some("https"), Some("docs.example.com")), "https://docs.example.com/")]
    #[case(ctx(None, Some("https"), None), "http://localhost:5000/")]
    #[case(ctx(Some("evil.com/path"), None, None), "http://localhost:5000/")]
    #[case(ctx(Some("user@evil.com"), None, None), "http://localhost:5000/")]
    fn test_from_request(#[case] context: RequestContext, #[case] expected: &str) {
        let resolver = UrlResolver::new(
            UrlResolutionStrategy::from_settings(&settings(None, true), 5000)
                .expect("valid settings"),
        );
        assert_eq!(resolver.resolve(&context).as_str(), expected);
    }

    #[test]
    fn test_connection_scheme_used_without_forwarded_proto() {
        let resolver = UrlResolver::new(UrlResolutionStrategy::FromRequest {
            fallback: local_url(5000).expect("local url"),
        });
        let context = RequestContext {
            scheme: Some("https".to_string()),
            host: Some("docs.example.com".to_string()),
            ..RequestContext::default()
        };
        assert_eq!(resolver.resolve(&context).as_str(), "https://docs.example.com/");
    }

    #[rstest]
    #[case("http://localhost:5000", "http://localhost:5000/download/1700000000000-a.pdf")]
    #[case("https://files.example.com/", "https://files.example.com/download/1700000000000-a.pdf")]
    #[case("https://example.com/docdrop", "https://example.com/docdrop/download/1700000000000-a.pdf")]
    #[case("https://example.com/docdrop/", "https://example.com/docdrop/download/1700000000000-a.pdf")]
    fn test_retrieval_url(#[case] base: &str, #[case] expected: &str) {
        let resolver = UrlResolver::new(UrlResolutionStrategy::default_local(5000).expect("local url"));
        let base = Url::parse(base).expect("valid base");
        let url = resolver
            .retrieval_url(&base, "1700000000000-a.pdf")
            .expect("should build url");
        assert_eq!(url.as_str(), expected);
    }

    #[test]
    fn test_retrieval_url_encodes_unsafe_key() {
        let resolver = UrlResolver::new(UrlResolutionStrategy::default_local(5000).expect("local url"));
        let base = local_url(5000).expect("local url");
        let url = resolver
            .retrieval_url(&base, "1-a b/c.pdf")
            .expect("should build url");
        assert_eq!(url.as_str(), "http://localhost:5000/download/1-a%20b%2Fc.pdf");
    }

    #[test]
    fn test_static_url_query_stripped() {
        let strategy = UrlResolutionStrategy::from_settings(
            &settings(Some("https://files.example.com/?utm=x#top"), false),
            5000,
        )
        .expect("valid settings");
        assert_eq!(
            strategy,
            UrlResolutionStrategy::Static(Url::parse("https://files.example.com/").expect("url"))
        );
    }
}

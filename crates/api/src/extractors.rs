//! Request extractors.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::HOST, request::Parts},
};

use docdrop_core::url_resolver::RequestContext;

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";
const X_FORWARDED_HOST: &str = "x-forwarded-host";

/// Connection facts for public URL resolution.
///
/// Always extracted; whether the forwarded values are trusted is up to the
/// configured resolution strategy.
#[derive(Debug, Clone, Default)]
pub struct ForwardedContext(pub RequestContext);

impl<S> FromRequestParts<S> for ForwardedContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let headers = &parts.headers;
        let host = header_str(headers, HOST.as_str())
            .or_else(|| parts.uri.authority().map(|a| a.as_str().to_string()));

        Ok(Self(RequestContext {
            scheme: parts.uri.scheme_str().map(String::from),
            host,
            forwarded_proto: header_str(headers, X_FORWARDED_PROTO),
            forwarded_host: header_str(headers, X_FORWARDED_HOST),
        }))
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

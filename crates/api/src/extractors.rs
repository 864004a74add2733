//! Request extractors.

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts, Query},
    http::{header, request::Parts, HeaderMap},
};
use serde::Deserialize;
use std::net::SocketAddr;
use tracker_core::{extract_admin_token, AdminToken};

use crate::response::ApiError;
use crate::state::AppState;

/// Client address.
///
/// Behind a trusted proxy: first `X-Forwarded-For` hop, then `X-Real-IP`,
/// then the socket peer. Otherwise the socket peer only, since forwarding
/// headers are client controlled. Left unparsed; exclusion matching
/// normalizes it.
#[derive(Debug, Clone)]
pub struct ClientIp(pub Option<String>);

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn forwarded_client(headers: &HeaderMap) -> Option<String> {
    header_str(headers, "x-forwarded-for")
        .and_then(|chain| chain.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .or_else(|| header_str(headers, "x-real-ip"))
        .map(str::to_string)
}

fn resolve_client(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> Option<String> {
    trust_proxy
        .then(|| forwarded_client(headers))
        .flatten()
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}

#[async_trait]
impl FromRequestParts<AppState> for ClientIp {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Ok(ClientIp(resolve_client(&parts.headers, peer, state.trust_proxy)))
    }
}

/// Browser user agent header.
#[derive(Debug, Clone)]
pub struct UserAgent(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for UserAgent
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(UserAgent(
            parts
                .headers
                .get(header::USER_AGENT)
                .and_then(|h| h.to_str().ok())
                .map(str::to_string),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Authenticated admin request.
///
/// Token from `?token=` or `Authorization: Bearer`, checked against the
/// issued-token cache.
#[derive(Debug, Clone)]
pub struct AdminContext {
    pub token: AdminToken,
}

#[async_trait]
impl FromRequestParts<AppState> for AdminContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let query = Query::<TokenQuery>::try_from_uri(&parts.uri)
            .map(|Query(q)| q)
            .unwrap_or(TokenQuery { token: None });

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let token = extract_admin_token(query.token.as_deref(), auth_header)?;
        state.admin.validate(&token).await?;

        Ok(AdminContext { token })
    }
}

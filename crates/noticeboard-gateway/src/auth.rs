//! Tenant authentication
//!
//! Handlers receive the caller as a [`Tenant`] extractor. How credentials map
//! to a tenant is behind [`TenantResolver`]; the shipped resolver checks HTTP
//! Basic credentials against the configured tenant table.

use crate::config::TenantCredential;
use crate::error::ApiError;
use crate::routes::AppState;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use base64::{engine::general_purpose::STANDARD, Engine};
use noticeboard_types::{TenantId, TypesError};
use std::collections::HashMap;

/// Maps the raw `Authorization` header to a tenant, or `None` if the caller
/// is not authenticated
pub trait TenantResolver: Send + Sync {
    fn resolve(&self, authorization: Option<&str>) -> Option<TenantId>;
}

/// Fixed tenant/secret table loaded from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticTenants {
    secrets: HashMap<TenantId, String>,
}

impl StaticTenants {
    pub fn new(credentials: &[TenantCredential]) -> Result<Self, TypesError> {
        let mut secrets = HashMap::with_capacity(credentials.len());
        for credential in credentials {
            secrets.insert(TenantId::new(credential.id.as_str())?, credential.secret.clone());
        }
        Ok(Self { secrets })
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

impl TenantResolver for StaticTenants {
    fn resolve(&self, authorization: Option<&str>) -> Option<TenantId> {
        let (user, secret) = parse_basic(authorization?)?;
        let tenant = TenantId::new(user).ok()?;
        match self.secrets.get(&tenant) {
            Some(expected) if *expected == secret => Some(tenant),
            _ => None,
        }
    }
}

/// Split a `Basic <base64(user:secret)>` header value
pub fn parse_basic(header: &str) -> Option<(String, String)> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, secret) = decoded.split_once(':')?;
    Some((user.to_string(), secret.to_string()))
}

/// The authenticated caller of a request
#[derive(Debug, Clone)]
pub struct Tenant(pub TenantId);

#[async_trait]
impl FromRequestParts<AppState> for Tenant {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        state
            .resolver
            .resolve(header)
            .map(Tenant)
            .ok_or(ApiError::Unauthorized)
    }
}

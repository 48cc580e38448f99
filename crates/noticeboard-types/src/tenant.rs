use crate::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator used when tenant sets are projected into a single text column
pub const TENANT_SEPARATOR: char = ',';

/// Authenticated party on whose behalf a request runs
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Result<Self, TypesError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(TypesError::EmptyTenant);
        }
        if id.contains(TENANT_SEPARATOR) {
            return Err(TypesError::TenantSeparator(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Join a tenant set into its text projection
    pub fn join(ids: &[TenantId]) -> String {
        ids.iter()
            .map(TenantId::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Split a text projection back into tenant ids, skipping empty segments
    pub fn split(joined: &str) -> Result<Vec<TenantId>, TypesError> {
        joined
            .split(TENANT_SEPARATOR)
            .filter(|part| !part.is_empty())
            .map(TenantId::new)
            .collect()
    }
}

impl TryFrom<String> for TenantId {
    type Error = TypesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TenantId> for String {
    fn from(id: TenantId) -> Self {
        id.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_and_separator() {
        assert_eq!(TenantId::new("  "), Err(TypesError::EmptyTenant));
        assert!(matches!(
            TenantId::new("a,b"),
            Err(TypesError::TenantSeparator(_))
        ));
    }

    #[test]
    fn test_join_and_split() {
        let ids = vec![TenantId::new("alice").unwrap(), TenantId::new("bob").unwrap()];
        let joined = TenantId::join(&ids);
        assert_eq!(joined, "alice,bob");
        assert_eq!(TenantId::split(&joined).unwrap(), ids);
        assert!(TenantId::split("").unwrap().is_empty());
    }
}

//! Tenant scoping predicates
//!
//! Membership lives in `message_members`, one row per (message, role, tenant),
//! so every check is an exact match on an indexed column.

use noticeboard_types::TenantId;
use sqlx::{QueryBuilder, Sqlite};

/// Role a tenant plays on a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Sender,
    Introducer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Sender => "sender",
            Role::Introducer => "introducer",
        }
    }
}

/// Which rows a tenant may touch for a given operation
#[derive(Debug, Clone, Copy)]
pub enum Scope<'t> {
    /// Listing: the tenant is an introducer or the message has none
    Visible(&'t TenantId),
    /// Status changes: the tenant is an introducer
    Recipient(&'t TenantId),
    /// Update and delete: the tenant is a sender
    Owner(&'t TenantId),
}

/// Append the scope predicate for the messages row aliased `row`
///
/// The caller is responsible for the surrounding `AND`.
pub fn push_scope(qb: &mut QueryBuilder<'_, Sqlite>, row: &'static str, scope: Scope<'_>) {
    match scope {
        Scope::Visible(tenant) => {
            qb.push("(");
            push_member_exists(qb, row, Role::Introducer, tenant);
            qb.push(" OR NOT ");
            push_role_exists(qb, row, Role::Introducer);
            qb.push(")");
        }
        Scope::Recipient(tenant) => push_member_exists(qb, row, Role::Introducer, tenant),
        Scope::Owner(tenant) => push_member_exists(qb, row, Role::Sender, tenant),
    }
}

fn push_member_exists(
    qb: &mut QueryBuilder<'_, Sqlite>,
    row: &'static str,
    role: Role,
    tenant: &TenantId,
) {
    qb.push("EXISTS (SELECT 1 FROM message_members mm WHERE mm.message_pk = ")
        .push(row)
        .push(".id AND mm.role = ")
        .push_bind(role.as_str())
        .push(" AND mm.tenant_id = ")
        .push_bind(tenant.as_str().to_string())
        .push(")");
}

fn push_role_exists(qb: &mut QueryBuilder<'_, Sqlite>, row: &'static str, role: Role) {
    qb.push("EXISTS (SELECT 1 FROM message_members mm WHERE mm.message_pk = ")
        .push(row)
        .push(".id AND mm.role = ")
        .push_bind(role.as_str())
        .push(")");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(scope: Scope<'_>) -> String {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT m.id FROM messages m WHERE ");
        push_scope(&mut qb, "m", scope);
        qb.sql().to_string()
    }

    #[test]
    fn test_visible_is_introducer_or_public() {
        let tenant = TenantId::new("alice").unwrap();
        let sql = render(Scope::Visible(&tenant));
        assert!(sql.contains("mm.tenant_id = ?"));
        assert!(sql.contains(" OR NOT EXISTS"));
        assert!(!sql.contains("alice"));
    }

    #[test]
    fn test_owner_and_recipient_bind_tenant() {
        let tenant = TenantId::new("x' OR '1'='1").unwrap();
        for scope in [Scope::Owner(&tenant), Scope::Recipient(&tenant)] {
            let sql = render(scope);
            assert!(sql.contains("mm.role = ?"));
            assert!(!sql.contains("OR '1'"));
            assert!(!sql.contains(" OR NOT "));
        }
    }
}

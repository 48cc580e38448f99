//! Bulk status updates and deletes
//!
//! Every item in a batch is committed on its own. A failing item yields a
//! `success: false` outcome and never aborts the rest of the batch, so these
//! methods return outcomes rather than `Result`.
//!
//! Deletes cannot learn per-id results from a batched `DELETE ... IN (...)`,
//! so they run in three phases:
//!
//! 1. claim: select the requested ids the tenant owns
//! 2. delete: hard delete or tombstone the claimed ids
//! 3. verify: re-select the claimed ids; those still present failed
//!
//! An id is reported deleted only if it was claimed and is gone afterwards.
//! Message ids are never reused, so a row reappearing between phases 2 and 3
//! can only be the same row surviving the delete.

use crate::store::{timestamp, MessageStore};
use crate::visibility::{push_scope, Scope};
use chrono::Utc;
use futures::future::join_all;
use noticeboard_types::{DeleteOutcome, DeleteRequest, MessageId, StatusChange, StatusOutcome, TenantId};
use sqlx::{QueryBuilder, Sqlite};
use std::collections::HashSet;
use tracing::{info, warn};

/// How a partition of a delete batch is removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeleteMode {
    Hard,
    Soft,
}

impl DeleteMode {
    /// Soft deletes only target live rows; hard deletes target any row
    fn live_only(self) -> bool {
        self == DeleteMode::Soft
    }
}

impl MessageStore {
    /// Apply each status change where `tenant` is a recipient
    ///
    /// Items run concurrently; outcomes come back in input order.
    pub async fn update_statuses(
        &self,
        tenant: &TenantId,
        changes: &[StatusChange],
    ) -> Vec<StatusOutcome> {
        let outcomes = join_all(changes.iter().map(|change| self.update_status(tenant, change))).await;

        let succeeded = outcomes.iter().filter(|o| o.success).count();
        info!(
            "Status update by {}: {}/{} succeeded",
            tenant,
            succeeded,
            outcomes.len()
        );
        outcomes
    }

    async fn update_status(&self, tenant: &TenantId, change: &StatusChange) -> StatusOutcome {
        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE messages SET status = ");
        qb.push_bind(change.status.code())
            .push(", updated_at = ")
            .push_bind(timestamp(Utc::now()))
            .push(" WHERE message_id = ")
            .push_bind(change.id.as_str().to_string())
            .push(" AND deleted_at IS NULL AND ");
        push_scope(&mut qb, "messages", Scope::Recipient(tenant));

        let success = match qb.build().execute(self.pool()).await {
            Ok(result) => result.rows_affected() > 0,
            Err(e) => {
                warn!("Status update of {} for {} failed: {}", change.id, tenant, e);
                false
            }
        };

        StatusOutcome {
            id: change.id.clone(),
            status: change.status,
            success,
        }
    }

    /// Delete each requested message `tenant` owns, hard or soft per item
    ///
    /// Outcomes come back in input order, one per request.
    pub async fn delete_messages(
        &self,
        tenant: &TenantId,
        requests: &[DeleteRequest],
    ) -> Vec<DeleteOutcome> {
        let (hard, soft): (Vec<&DeleteRequest>, Vec<&DeleteRequest>) =
            requests.iter().partition(|r| r.hard_delete);
        let hard_ids: Vec<MessageId> = hard.iter().map(|r| r.message_id.clone()).collect();
        let soft_ids: Vec<MessageId> = soft.iter().map(|r| r.message_id.clone()).collect();

        // Claim both partitions before deleting either, so an id requested
        // both ways is judged against the same starting state.
        let hard_claimed = self.claim(tenant, &hard_ids, DeleteMode::Hard).await;
        let soft_claimed = self.claim(tenant, &soft_ids, DeleteMode::Soft).await;

        self.remove(tenant, &hard_claimed, DeleteMode::Hard).await;
        self.remove(tenant, &soft_claimed, DeleteMode::Soft).await;

        let hard_deleted = self.verify(&hard_claimed, DeleteMode::Hard).await;
        let soft_deleted = self.verify(&soft_claimed, DeleteMode::Soft).await;

        let outcomes: Vec<DeleteOutcome> = requests
            .iter()
            .map(|r| {
                let deleted = if r.hard_delete {
                    &hard_deleted
                } else {
                    &soft_deleted
                };
                DeleteOutcome {
                    id: r.message_id.clone(),
                    hard_delete: r.hard_delete,
                    success: deleted.contains(&r.message_id),
                }
            })
            .collect();

        let succeeded = outcomes.iter().filter(|o| o.success).count();
        info!(
            "Delete by {}: {}/{} succeeded ({} hard, {} soft requested)",
            tenant,
            succeeded,
            outcomes.len(),
            hard_ids.len(),
            soft_ids.len()
        );
        outcomes
    }

    /// Phase 1: the subset of `ids` owned by `tenant` that `mode` may delete
    async fn claim(&self, tenant: &TenantId, ids: &[MessageId], mode: DeleteMode) -> HashSet<MessageId> {
        if ids.is_empty() {
            return HashSet::new();
        }

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT m.message_id FROM messages m WHERE ");
        push_id_list(&mut qb, "m.message_id", ids);
        if mode.live_only() {
            qb.push(" AND m.deleted_at IS NULL");
        }
        qb.push(" AND ");
        push_scope(&mut qb, "m", Scope::Owner(tenant));

        match qb.build_query_scalar::<String>().fetch_all(self.pool()).await {
            Ok(found) => parse_ids(found),
            Err(e) => {
                warn!("Delete claim ({:?}) for {} failed: {}", mode, tenant, e);
                HashSet::new()
            }
        }
    }

    /// Phase 2: the delete statement itself; its result is not trusted
    async fn remove(&self, tenant: &TenantId, claimed: &HashSet<MessageId>, mode: DeleteMode) {
        if claimed.is_empty() {
            return;
        }
        let ids: Vec<MessageId> = claimed.iter().cloned().collect();

        let mut qb = match mode {
            DeleteMode::Hard => QueryBuilder::<Sqlite>::new("DELETE FROM messages WHERE "),
            DeleteMode::Soft => {
                let mut qb = QueryBuilder::<Sqlite>::new("UPDATE messages SET deleted_at = ");
                qb.push_bind(timestamp(Utc::now()))
                    .push(" WHERE deleted_at IS NULL AND ");
                qb
            }
        };
        push_id_list(&mut qb, "message_id", &ids);
        qb.push(" AND ");
        push_scope(&mut qb, "messages", Scope::Owner(tenant));

        if let Err(e) = qb.build().execute(self.pool()).await {
            warn!("Delete ({:?}) for {} failed: {}", mode, tenant, e);
        }
    }

    /// Phase 3: the claimed ids that are no longer present
    async fn verify(&self, claimed: &HashSet<MessageId>, mode: DeleteMode) -> HashSet<MessageId> {
        if claimed.is_empty() {
            return HashSet::new();
        }
        let ids: Vec<MessageId> = claimed.iter().cloned().collect();

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT message_id FROM messages WHERE ");
        push_id_list(&mut qb, "message_id", &ids);
        if mode.live_only() {
            qb.push(" AND deleted_at IS NULL");
        }

        match qb.build_query_scalar::<String>().fetch_all(self.pool()).await {
            Ok(remaining) => {
                let remaining = parse_ids(remaining);
                claimed.difference(&remaining).cloned().collect()
            }
            Err(e) => {
                warn!("Delete verification ({:?}) failed: {}", mode, e);
                HashSet::new()
            }
        }
    }
}

fn push_id_list(qb: &mut QueryBuilder<'_, Sqlite>, column: &'static str, ids: &[MessageId]) {
    qb.push(column).push(" IN (");
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(id.as_str().to_string());
    }
    separated.push_unseparated(")");
}

/// Ids read back from the store; malformed values cannot match a request
fn parse_ids(raw: Vec<String>) -> HashSet<MessageId> {
    raw.into_iter().filter_map(|id| MessageId::parse(id).ok()).collect()
}

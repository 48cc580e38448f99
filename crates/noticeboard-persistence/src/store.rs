use crate::config::DatabaseConfig;
use crate::error::{Result, StoreError};
use crate::query::{assemble, ListQuery, MESSAGE_COLUMNS};
use crate::visibility::{push_scope, Role, Scope};
use chrono::{DateTime, SecondsFormat, Utc};
use noticeboard_types::{Message, MessageDraft, MessageId, MessageStatus, TenantId};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{info, warn};

/// Default number of messages per listing page
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Message store backed by a SQLite connection pool
///
/// Cheap to clone; every clone shares the same pool.
#[derive(Clone)]
pub struct MessageStore {
    pool: SqlitePool,
    page_size: i64,
}

#[derive(Debug, FromRow)]
pub(crate) struct MessageRow {
    message_id: String,
    sender_ids: String,
    title: String,
    content: String,
    category: String,
    big_content: String,
    introducer_ids: String,
    status: i64,
    created_at: String,
    updated_at: String,
}

impl TryFrom<MessageRow> for Message {
    type Error = StoreError;

    fn try_from(row: MessageRow) -> Result<Self> {
        Ok(Message {
            message_id: MessageId::parse(row.message_id)?,
            sender_ids: TenantId::split(&row.sender_ids)?,
            title: row.title,
            content: row.content,
            category: row.category,
            big_content: row.big_content,
            introducer_ids: TenantId::split(&row.introducer_ids)?,
            status: MessageStatus::try_from(row.status)?,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

/// Fixed-width RFC 3339 so text ordering matches time ordering
pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("timestamp '{}': {}", raw, e)))
}

impl MessageStore {
    /// Open the pool described by `config`, retrying failed attempts, and
    /// apply the schema
    pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        let attempts = config.connect_retries.max(1);
        let mut attempt = 1;
        let pool = loop {
            let result = SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .min_connections(config.min_connections)
                .max_lifetime(config.max_lifetime())
                .idle_timeout(config.idle_timeout())
                .connect_with(options.clone())
                .await;

            match result {
                Ok(pool) => break pool,
                Err(e) if attempt < attempts => {
                    warn!(
                        "Database connection failed ({}), attempt {}/{}, retrying in {}s",
                        e, attempt, attempts, config.retry_delay_secs
                    );
                    attempt += 1;
                    tokio::time::sleep(config.retry_delay()).await;
                }
                Err(e) => {
                    return Err(anyhow::Error::new(e).context(format!(
                        "failed to open database {} after {} attempts",
                        config.path, attempts
                    )))
                }
            }
        };

        let store = Self::from_pool(pool);
        store.migrate().await?;

        info!("Message store initialized with database: {}", config.path);
        Ok(store)
    }

    /// Wrap an existing pool; the schema is not applied
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: i64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Apply the schema; safe to run repeatedly
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(include_str!("../migrations/001_messages.sql"))
            .execute(&self.pool)
            .await?;

        info!("Database migrations completed");
        Ok(())
    }

    /// One page of messages visible to `tenant`
    pub async fn list(&self, tenant: &TenantId, query: &ListQuery) -> Result<Vec<Message>> {
        let rows: Vec<MessageRow> = assemble(tenant, query, self.page_size)
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Message::try_from).collect()
    }

    /// A single live message visible to `tenant`
    pub async fn find_visible(
        &self,
        tenant: &TenantId,
        message_id: &MessageId,
    ) -> Result<Option<Message>> {
        self.find_scoped(Scope::Visible(tenant), message_id).await
    }

    /// A single live message sent by `tenant`; the lookup that gates updates
    pub async fn find_owned(
        &self,
        tenant: &TenantId,
        message_id: &MessageId,
    ) -> Result<Option<Message>> {
        self.find_scoped(Scope::Owner(tenant), message_id).await
    }

    async fn find_scoped(&self, scope: Scope<'_>, message_id: &MessageId) -> Result<Option<Message>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT ");
        qb.push(MESSAGE_COLUMNS)
            .push(" FROM messages m WHERE m.deleted_at IS NULL AND m.message_id = ")
            .push_bind(message_id.as_str().to_string())
            .push(" AND ");
        push_scope(&mut qb, "m", scope);

        let row: Option<MessageRow> = qb.build_query_as().fetch_optional(&self.pool).await?;
        row.map(Message::try_from).transpose()
    }

    /// Read back a row just written, tombstoned or not
    async fn find_by_message_id(&self, message_id: &MessageId) -> Result<Message> {
        let sql = format!("SELECT {} FROM messages m WHERE m.message_id = ?", MESSAGE_COLUMNS);
        let row: Option<MessageRow> = sqlx::query_as(&sql)
            .bind(message_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.ok_or(StoreError::NotFound).and_then(Message::try_from)
    }

    /// Create a message owned by `tenant`
    ///
    /// The new record is read back from the store before returning.
    pub async fn create(&self, tenant: &TenantId, draft: &MessageDraft) -> Result<Message> {
        let introducers = draft.introducers()?;
        let senders = vec![tenant.clone()];
        let message_id = MessageId::generate();
        let now = timestamp(Utc::now());

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO messages
                (message_id, sender_ids, title, content, category, big_content,
                 introducer_ids, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(message_id.as_str())
        .bind(TenantId::join(&senders))
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(&draft.category)
        .bind(&draft.big_content)
        .bind(TenantId::join(&introducers))
        .bind(MessageStatus::Unread.code())
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::from_write)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::MutationFailed("no row inserted".to_string()));
        }
        let pk = result.last_insert_rowid();

        insert_members(&mut *tx, pk, Role::Sender, &senders).await?;
        insert_members(&mut *tx, pk, Role::Introducer, &introducers).await?;
        tx.commit().await.map_err(StoreError::from_write)?;

        info!("Message {} created by {}", message_id, tenant);
        self.find_by_message_id(&message_id).await
    }

    /// Replace the content fields of `existing` with `draft`
    ///
    /// `existing` must come from [`MessageStore::find_owned`] for the same
    /// tenant. Senders and the message id are never touched.
    pub async fn update(
        &self,
        tenant: &TenantId,
        existing: &Message,
        draft: &MessageDraft,
    ) -> Result<Message> {
        let introducers = draft.introducers()?;
        let now = timestamp(Utc::now());

        let mut tx = self.pool.begin().await?;

        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE messages SET title = ");
        qb.push_bind(draft.title.clone())
            .push(", content = ")
            .push_bind(draft.content.clone())
            .push(", category = ")
            .push_bind(draft.category.clone())
            .push(", big_content = ")
            .push_bind(draft.big_content.clone())
            .push(", introducer_ids = ")
            .push_bind(TenantId::join(&introducers))
            .push(", updated_at = ")
            .push_bind(now)
            .push(" WHERE message_id = ")
            .push_bind(existing.message_id.as_str().to_string())
            .push(" AND deleted_at IS NULL AND ");
        push_scope(&mut qb, "messages", Scope::Owner(tenant));

        let result = qb
            .build()
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from_write)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::MutationFailed("no row updated".to_string()));
        }

        let pk: i64 = sqlx::query_scalar("SELECT id FROM messages WHERE message_id = ?")
            .bind(existing.message_id.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(StoreError::from_write)?;

        sqlx::query("DELETE FROM message_members WHERE message_pk = ? AND role = ?")
            .bind(pk)
            .bind(Role::Introducer.as_str())
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from_write)?;
        insert_members(&mut *tx, pk, Role::Introducer, &introducers).await?;
        tx.commit().await.map_err(StoreError::from_write)?;

        info!("Message {} updated by {}", existing.message_id, tenant);
        self.find_by_message_id(&existing.message_id).await
    }
}

async fn insert_members(
    conn: &mut SqliteConnection,
    pk: i64,
    role: Role,
    tenants: &[TenantId],
) -> Result<()> {
    for tenant in tenants {
        sqlx::query("INSERT INTO message_members (message_pk, tenant_id, role) VALUES (?, ?, ?)")
            .bind(pk)
            .bind(tenant.as_str())
            .bind(role.as_str())
            .execute(&mut *conn)
            .await
            .map_err(StoreError::from_write)?;
    }
    Ok(())
}

//! PostgreSQL storage backend.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;
use zenbali_core::{
    slugify, Admin, AdminId, Creator, CreatorId, Event, EventId, EventQuery, NewEvent,
    NewPayment, Pagination, Payment, PaymentId, PaymentQuery, PaymentStatus, ReferenceItem,
    ReferenceKind,
};

use crate::error::{Result, StoreError};
use crate::schema::{
    CREATOR_COLUMNS, EVENT_COLUMNS, EVENT_FROM, EVENT_ORDER, PAYMENT_COLUMNS, PAYMENT_FROM,
    REFERENCE_COLUMNS,
};
use crate::Store;

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be reached.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Apply pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_event(&self, id: EventId) -> Result<Option<Event>> {
        let sql = format!("SELECT {EVENT_COLUMNS} {EVENT_FROM} WHERE e.id = $1");
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Event::from))
    }

    async fn fetch_payment(&self, session_id: &str) -> Result<Option<Payment>> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} {PAYMENT_FROM} WHERE p.stripe_session_id = $1");
        sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Payment::try_from)
            .transpose()
    }

    async fn require_event(&self, id: EventId) -> Result<Event> {
        self.fetch_event(id)
            .await?
            .ok_or_else(|| StoreError::not_found("event", id))
    }
}

// ============================================================================
// Rows
// ============================================================================

#[derive(sqlx::FromRow)]
struct CreatorRow {
    id: Uuid,
    name: String,
    organization_name: Option<String>,
    email: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<CreatorRow> for Creator {
    fn from(row: CreatorRow) -> Self {
        Self {
            id: CreatorId::from_uuid(row.id),
            name: row.name,
            organization_name: row.organization_name,
            email: row.email,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AdminRow {
    id: Uuid,
    name: String,
    email: String,
    is_active: bool,
}

impl From<AdminRow> for Admin {
    fn from(row: AdminRow) -> Self {
        Self {
            id: AdminId::from_uuid(row.id),
            name: row.name,
            email: row.email,
            is_active: row.is_active,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReferenceRow {
    id: i32,
    name: String,
    slug: String,
    is_active: bool,
}

impl From<ReferenceRow> for ReferenceItem {
    fn from(row: ReferenceRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            is_active: row.is_active,
        }
    }
}

#[derive(sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    creator_id: Uuid,
    title: String,
    event_date: NaiveDate,
    event_time: Option<String>,
    location_id: i32,
    event_type_id: i32,
    entrance_type_id: i32,
    entrance_fee: Decimal,
    duration: Option<String>,
    participant_group_type: Option<String>,
    lead_by: Option<String>,
    contact_email: String,
    contact_mobile: Option<String>,
    notes: Option<String>,
    image_url: Option<String>,
    is_paid: bool,
    is_published: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    creator_name: String,
    organization_name: Option<String>,
    location_name: String,
    event_type_name: String,
    entrance_type_name: String,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self {
            id: EventId::from_uuid(row.id),
            creator_id: CreatorId::from_uuid(row.creator_id),
            title: row.title,
            event_date: row.event_date,
            event_time: row.event_time,
            location_id: row.location_id,
            event_type_id: row.event_type_id,
            entrance_type_id: row.entrance_type_id,
            entrance_fee: row.entrance_fee,
            duration: row.duration,
            participant_group_type: row.participant_group_type,
            lead_by: row.lead_by,
            contact_email: row.contact_email,
            contact_mobile: row.contact_mobile,
            notes: row.notes,
            image_url: row.image_url,
            is_paid: row.is_paid,
            is_published: row.is_published,
            created_at: row.created_at,
            updated_at: row.updated_at,
            creator_name: row.creator_name,
            organization_name: row.organization_name,
            location_name: row.location_name,
            event_type_name: row.event_type_name,
            entrance_type_name: row.entrance_type_name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    event_id: Uuid,
    creator_id: Uuid,
    stripe_session_id: String,
    stripe_payment_intent_id: Option<String>,
    amount_cents: i64,
    currency: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    event_title: String,
    creator_name: String,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = StoreError;

    fn try_from(row: PaymentRow) -> Result<Self> {
        let status = row
            .status
            .parse::<PaymentStatus>()
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Self {
            id: PaymentId::from_uuid(row.id),
            event_id: EventId::from_uuid(row.event_id),
            creator_id: CreatorId::from_uuid(row.creator_id),
            session_id: row.stripe_session_id,
            payment_intent_id: row.stripe_payment_intent_id,
            amount_cents: row.amount_cents,
            currency: row.currency,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
            event_title: row.event_title,
            creator_name: row.creator_name,
        })
    }
}

// ============================================================================
// Query building
// ============================================================================

/// Escape `LIKE` wildcards so user input matches literally.
fn escape_like(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn push_event_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &EventQuery) {
    qb.push(" WHERE TRUE");
    if query.only_published {
        qb.push(" AND e.is_published");
    }
    if let Some(day) = query.not_before {
        qb.push(" AND e.event_date >= ").push_bind(day);
    }
    if let Some(id) = query.creator_id {
        qb.push(" AND e.creator_id = ").push_bind(*id.as_uuid());
    }
    if let Some(id) = query.location_id {
        qb.push(" AND e.location_id = ").push_bind(id);
    }
    if let Some(id) = query.event_type_id {
        qb.push(" AND e.event_type_id = ").push_bind(id);
    }
    if let Some(id) = query.entrance_type_id {
        qb.push(" AND e.entrance_type_id = ").push_bind(id);
    }
    if let Some(day) = query.date_from {
        qb.push(" AND e.event_date >= ").push_bind(day);
    }
    if let Some(day) = query.date_to {
        qb.push(" AND e.event_date <= ").push_bind(day);
    }
    if let Some(needle) = &query.search {
        let pattern = format!("%{}%", escape_like(needle));
        qb.push(" AND (e.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR c.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR c.organization_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR e.notes ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn push_payment_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &PaymentQuery) {
    qb.push(" WHERE TRUE");
    if let Some(id) = query.creator_id {
        qb.push(" AND p.creator_id = ").push_bind(*id.as_uuid());
    }
    if let Some(id) = query.event_id {
        qb.push(" AND p.event_id = ").push_bind(*id.as_uuid());
    }
    if let Some(status) = query.status {
        qb.push(" AND p.status = ").push_bind(status.as_str());
    }
}

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn to_u64(n: i64) -> u64 {
    u64::try_from(n).unwrap_or(0)
}

// ============================================================================
// Store implementation
// ============================================================================

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get_creator(&self, id: CreatorId) -> Result<Option<Creator>> {
        let sql = format!("SELECT {CREATOR_COLUMNS} FROM creators WHERE id = $1");
        let row = sqlx::query_as::<_, CreatorRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Creator::from))
    }

    async fn get_admin(&self, id: AdminId) -> Result<Option<Admin>> {
        let row = sqlx::query_as::<_, AdminRow>(
            "SELECT id, name, email, is_active FROM admins WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Admin::from))
    }

    async fn list_creators(&self, window: Pagination) -> Result<(Vec<Creator>, u64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM creators")
            .fetch_one(&self.pool)
            .await?;
        let sql = format!(
            "SELECT {CREATOR_COLUMNS} FROM creators \
             ORDER BY created_at DESC, id ASC LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as::<_, CreatorRow>(&sql)
            .bind(i64::from(window.limit()))
            .bind(to_i64(window.offset()))
            .fetch_all(&self.pool)
            .await?;
        Ok((rows.into_iter().map(Creator::from).collect(), to_u64(total)))
    }

    async fn set_creator_active(&self, id: CreatorId, is_active: bool) -> Result<Creator> {
        let sql = format!(
            "UPDATE creators SET is_active = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {CREATOR_COLUMNS}"
        );
        sqlx::query_as::<_, CreatorRow>(&sql)
            .bind(*id.as_uuid())
            .bind(is_active)
            .fetch_optional(&self.pool)
            .await?
            .map(Creator::from)
            .ok_or_else(|| StoreError::not_found("creator", id))
    }

    async fn update_creator_profile(&self, creator: &Creator) -> Result<Creator> {
        let sql = format!(
            "UPDATE creators SET name = $2, organization_name = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING {CREATOR_COLUMNS}"
        );
        sqlx::query_as::<_, CreatorRow>(&sql)
            .bind(*creator.id.as_uuid())
            .bind(&creator.name)
            .bind(creator.organization_name.as_deref())
            .fetch_optional(&self.pool)
            .await?
            .map(Creator::from)
            .ok_or_else(|| StoreError::not_found("creator", creator.id))
    }

    async fn list_reference(
        &self,
        kind: ReferenceKind,
        only_active: bool,
    ) -> Result<Vec<ReferenceItem>> {
        let filter = if only_active { " WHERE is_active" } else { "" };
        let sql = format!(
            "SELECT {REFERENCE_COLUMNS} FROM {}{filter} ORDER BY name ASC",
            kind.table()
        );
        let rows = sqlx::query_as::<_, ReferenceRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(ReferenceItem::from).collect())
    }

    async fn create_reference(&self, kind: ReferenceKind, name: &str) -> Result<ReferenceItem> {
        let sql = format!(
            "INSERT INTO {} (name, slug) VALUES ($1, $2) RETURNING {REFERENCE_COLUMNS}",
            kind.table()
        );
        let row = sqlx::query_as::<_, ReferenceRow>(&sql)
            .bind(name)
            .bind(slugify(name))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn update_reference(
        &self,
        kind: ReferenceKind,
        id: i32,
        name: &str,
        is_active: bool,
    ) -> Result<ReferenceItem> {
        let sql = format!(
            "UPDATE {} SET name = $2, slug = $3, is_active = $4, updated_at = NOW() \
             WHERE id = $1 RETURNING {REFERENCE_COLUMNS}",
            kind.table()
        );
        sqlx::query_as::<_, ReferenceRow>(&sql)
            .bind(id)
            .bind(name)
            .bind(slugify(name))
            .bind(is_active)
            .fetch_optional(&self.pool)
            .await?
            .map(ReferenceItem::from)
            .ok_or_else(|| StoreError::not_found(kind.label(), id))
    }

    async fn insert_event(&self, event: &NewEvent) -> Result<Event> {
        sqlx::query(
            "INSERT INTO events (id, creator_id, title, event_date, event_time, location_id, \
             event_type_id, entrance_type_id, entrance_fee, duration, participant_group_type, \
             lead_by, contact_email, contact_mobile, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(*event.id.as_uuid())
        .bind(*event.creator_id.as_uuid())
        .bind(&event.title)
        .bind(event.event_date)
        .bind(event.event_time.as_deref())
        .bind(event.location_id)
        .bind(event.event_type_id)
        .bind(event.entrance_type_id)
        .bind(event.entrance_fee)
        .bind(event.duration.as_deref())
        .bind(event.participant_group_type.as_deref())
        .bind(event.lead_by.as_deref())
        .bind(&event.contact_email)
        .bind(event.contact_mobile.as_deref())
        .bind(event.notes.as_deref())
        .execute(&self.pool)
        .await?;

        tracing::debug!(event_id = %event.id, creator_id = %event.creator_id, "Inserted event");
        self.require_event(event.id).await
    }

    async fn get_event(&self, id: EventId) -> Result<Option<Event>> {
        self.fetch_event(id).await
    }

    async fn update_event(&self, event: &NewEvent) -> Result<Event> {
        let result = sqlx::query(
            "UPDATE events SET title = $2, event_date = $3, event_time = $4, location_id = $5, \
             event_type_id = $6, entrance_type_id = $7, entrance_fee = $8, duration = $9, \
             participant_group_type = $10, lead_by = $11, contact_email = $12, \
             contact_mobile = $13, notes = $14, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(*event.id.as_uuid())
        .bind(&event.title)
        .bind(event.event_date)
        .bind(event.event_time.as_deref())
        .bind(event.location_id)
        .bind(event.event_type_id)
        .bind(event.entrance_type_id)
        .bind(event.entrance_fee)
        .bind(event.duration.as_deref())
        .bind(event.participant_group_type.as_deref())
        .bind(event.lead_by.as_deref())
        .bind(&event.contact_email)
        .bind(event.contact_mobile.as_deref())
        .bind(event.notes.as_deref())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("event", event.id));
        }
        self.require_event(event.id).await
    }

    async fn set_event_image(&self, id: EventId, image_url: &str) -> Result<Event> {
        let result =
            sqlx::query("UPDATE events SET image_url = $2, updated_at = NOW() WHERE id = $1")
                .bind(*id.as_uuid())
                .bind(image_url)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("event", id));
        }
        self.require_event(id).await
    }

    async fn delete_event(&self, id: EventId) -> Result<()> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("event", id));
        }
        Ok(())
    }

    async fn mark_event_paid_and_published(&self, id: EventId) -> Result<()> {
        let result = sqlx::query(
            "UPDATE events SET is_paid = TRUE, is_published = TRUE, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("event", id));
        }
        tracing::debug!(event_id = %id, "Event marked paid and published");
        Ok(())
    }

    async fn list_events(&self, query: &EventQuery) -> Result<(Vec<Event>, u64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) ");
        count.push(EVENT_FROM);
        push_event_filters(&mut count, query);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {EVENT_COLUMNS} "));
        select.push(EVENT_FROM);
        push_event_filters(&mut select, query);
        select
            .push(EVENT_ORDER)
            .push(" LIMIT ")
            .push_bind(i64::from(query.pagination.limit()))
            .push(" OFFSET ")
            .push_bind(to_i64(query.pagination.offset()));
        let rows = select
            .build_query_as::<EventRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok((rows.into_iter().map(Event::from).collect(), to_u64(total)))
    }

    async fn insert_payment(&self, payment: &NewPayment) -> Result<Payment> {
        sqlx::query(
            "INSERT INTO payments (id, event_id, creator_id, stripe_session_id, amount_cents, \
             currency, status) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(*payment.id.as_uuid())
        .bind(*payment.event_id.as_uuid())
        .bind(*payment.creator_id.as_uuid())
        .bind(&payment.session_id)
        .bind(payment.amount_cents)
        .bind(&payment.currency)
        .bind(PaymentStatus::Pending.as_str())
        .execute(&self.pool)
        .await?;

        self.fetch_payment(&payment.session_id)
            .await?
            .ok_or_else(|| StoreError::not_found("payment", &payment.session_id))
    }

    async fn get_payment_by_session(&self, session_id: &str) -> Result<Option<Payment>> {
        self.fetch_payment(session_id).await
    }

    async fn transition_payment(
        &self,
        session_id: &str,
        from: PaymentStatus,
        to: PaymentStatus,
        payment_intent_id: Option<&str>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE payments SET status = $3, \
             stripe_payment_intent_id = COALESCE($4, stripe_payment_intent_id), \
             updated_at = NOW() \
             WHERE stripe_session_id = $1 AND status = $2",
        )
        .bind(session_id)
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(payment_intent_id)
        .execute(&self.pool)
        .await?;

        let applied = result.rows_affected() == 1;
        tracing::debug!(session_id, %from, %to, applied, "Payment transition");
        Ok(applied)
    }

    async fn list_payments(&self, query: &PaymentQuery) -> Result<(Vec<Payment>, u64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM payments p");
        push_payment_filters(&mut count, query);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut select =
            QueryBuilder::<Postgres>::new(format!("SELECT {PAYMENT_COLUMNS} {PAYMENT_FROM}"));
        push_payment_filters(&mut select, query);
        select
            .push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ")
            .push_bind(i64::from(query.pagination.limit()))
            .push(" OFFSET ")
            .push_bind(to_i64(query.pagination.offset()));
        let rows = select
            .build_query_as::<PaymentRow>()
            .fetch_all(&self.pool)
            .await?;

        let payments = rows
            .into_iter()
            .map(Payment::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok((payments, to_u64(total)))
    }

    async fn list_completed_unpublished(&self) -> Result<Vec<Payment>> {
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} {PAYMENT_FROM} \
             WHERE p.status = $1 AND NOT e.is_published \
             ORDER BY p.created_at ASC"
        );
        sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(PaymentStatus::Completed.as_str())
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Payment::try_from)
            .collect()
    }
}

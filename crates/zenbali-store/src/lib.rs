//! Storage layer for zenbali.
//!
//! This crate provides persistence for events, payment attempts, reference
//! data and the account lookups the marketplace needs.
//!
//! # Backends
//!
//! - [`PgStore`]: PostgreSQL through `sqlx`, schema managed by the migrations in
//!   `./migrations`.
//! - [`MemoryStore`]: in-process maps behind a lock, used by tests and by local
//!   runs without a database.
//!
//! # Transitions
//!
//! Two writes carry the payment workflow's correctness:
//!
//! - [`Store::transition_payment`] is a compare-and-set on the payment status.
//!   Concurrent duplicate webhook deliveries race here and exactly one wins.
//! - [`Store::mark_event_paid_and_published`] sets both event flags in one
//!   statement, so `is_published` never appears without `is_paid`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod memory;
pub mod postgres;
pub mod schema;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use zenbali_core::{
    Admin, AdminId, Creator, CreatorId, Event, EventId, EventQuery, NewEvent, NewPayment,
    Pagination, Payment, PaymentQuery, PaymentStatus, ReferenceItem, ReferenceKind,
};

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different implementations
/// (PostgreSQL, in-memory for testing).
#[async_trait]
pub trait Store: Send + Sync {
    /// Check that the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be reached.
    async fn ping(&self) -> Result<()>;

    // =========================================================================
    // Account Lookups
    // =========================================================================

    /// Get a creator account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_creator(&self, id: CreatorId) -> Result<Option<Creator>>;

    /// Get an admin account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_admin(&self, id: AdminId) -> Result<Option<Admin>>;

    /// List one page of creators, newest first, with the total count.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_creators(&self, window: Pagination) -> Result<(Vec<Creator>, u64)>;

    /// Activate or deactivate a creator account.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the creator doesn't exist.
    async fn set_creator_active(&self, id: CreatorId, is_active: bool) -> Result<Creator>;

    /// Overwrite a creator's display name and organization name.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the creator doesn't exist.
    async fn update_creator_profile(&self, creator: &Creator) -> Result<Creator>;

    // =========================================================================
    // Reference Data
    // =========================================================================

    /// List reference items of one kind, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_reference(
        &self,
        kind: ReferenceKind,
        only_active: bool,
    ) -> Result<Vec<ReferenceItem>>;

    /// Create an active reference item.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if an item with the same slug exists.
    async fn create_reference(&self, kind: ReferenceKind, name: &str) -> Result<ReferenceItem>;

    /// Rename a reference item and set its active flag.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the item doesn't exist.
    async fn update_reference(
        &self,
        kind: ReferenceKind,
        id: i32,
        name: &str,
        is_active: bool,
    ) -> Result<ReferenceItem>;

    // =========================================================================
    // Event Operations
    // =========================================================================

    /// Insert a new unpaid, unpublished event and return the joined record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidReference` if the creator or a reference id
    /// does not exist.
    async fn insert_event(&self, event: &NewEvent) -> Result<Event>;

    /// Get an event by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_event(&self, id: EventId) -> Result<Option<Event>>;

    /// Overwrite the business fields of an existing event.
    ///
    /// Never touches `creator_id`, `image_url`, `is_paid` or `is_published`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the event doesn't exist, or
    /// `StoreError::InvalidReference` for an unknown reference id.
    async fn update_event(&self, event: &NewEvent) -> Result<Event>;

    /// Set the image URL of an event.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the event doesn't exist.
    async fn set_event_image(&self, id: EventId, image_url: &str) -> Result<Event>;

    /// Delete an event and its payment attempts.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the event doesn't exist.
    async fn delete_event(&self, id: EventId) -> Result<()>;

    /// Set `is_paid` and `is_published` together. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the event doesn't exist.
    async fn mark_event_paid_and_published(&self, id: EventId) -> Result<()>;

    /// List one page of events matching `query`, with the total match count.
    ///
    /// Ordered by event date ascending, then creation time descending, then ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_events(&self, query: &EventQuery) -> Result<(Vec<Event>, u64)>;

    // =========================================================================
    // Payment Operations
    // =========================================================================

    /// Record a pending payment.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the session ID is already recorded.
    async fn insert_payment(&self, payment: &NewPayment) -> Result<Payment>;

    /// Get a payment by its external checkout session ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_payment_by_session(&self, session_id: &str) -> Result<Option<Payment>>;

    /// Move a payment from `from` to `to` if and only if it is currently in `from`.
    ///
    /// Returns `true` if this call performed the transition and `false` if the
    /// payment was not in `from` (already handled, or unknown session).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn transition_payment(
        &self,
        session_id: &str,
        from: PaymentStatus,
        to: PaymentStatus,
        payment_intent_id: Option<&str>,
    ) -> Result<bool>;

    /// List one page of payments matching `query`, newest first, with the total.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_payments(&self, query: &PaymentQuery) -> Result<(Vec<Payment>, u64)>;

    /// Completed payments whose event is not published, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_completed_unpublished(&self) -> Result<Vec<Payment>>;
}

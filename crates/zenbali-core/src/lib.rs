//! Core types and utilities for zenbali.
//!
//! This crate provides the foundational types used throughout the events marketplace:
//!
//! - **Identifiers**: `EventId`, `PaymentId`, `CreatorId`, `AdminId`
//! - **Events**: `Event`, `NewEvent`, `EventChanges`, `EventFilter`, `EventQuery`
//! - **Payments**: `Payment`, `PaymentStatus`, `NewPayment`, `PaymentQuery`
//! - **Accounts**: `Creator`, `Admin`, `Actor`, `ProfileChanges`, `CreatorFilter`
//! - **Reference data**: `ReferenceItem`, `ReferenceKind`
//! - **Pagination**: `Pagination`, `Page`
//!
//! # Publication invariant
//!
//! An event is publicly listed only once its posting fee has been paid:
//! `is_published` implies `is_paid`. Nothing in this crate can produce the
//! opposite combination; the single transition that sets both flags lives in
//! the service's payment workflow.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod error;
pub mod event;
pub mod ids;
pub mod pagination;
pub mod payment;
pub mod reference;

pub use account::{Actor, Admin, Creator, CreatorFilter, ProfileChanges};
pub use error::{MarketError, Result};
pub use event::{
    parse_event_date, Event, EventChanges, EventFields, EventFilter, EventQuery, EventState,
    NewEvent, EVENT_DATE_FORMAT,
};
pub use ids::{AdminId, CreatorId, EventId, IdError, PaymentId};
pub use pagination::{Page, Pagination, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
pub use payment::{NewPayment, Payment, PaymentFilter, PaymentQuery, PaymentStatus};
pub use reference::{slugify, ReferenceItem, ReferenceKind};

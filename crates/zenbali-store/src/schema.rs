//! Database schema definitions.
//!
//! Column lists shared by the PostgreSQL queries, and the reference data every
//! fresh database starts with.

/// Joined event columns, aliased to match the event row struct.
pub const EVENT_COLUMNS: &str = "\
    e.id, e.creator_id, e.title, e.event_date, e.event_time, e.location_id, \
    e.event_type_id, e.entrance_type_id, e.entrance_fee, e.duration, \
    e.participant_group_type, e.lead_by, e.contact_email, e.contact_mobile, \
    e.notes, e.image_url, e.is_paid, e.is_published, e.created_at, e.updated_at, \
    c.name AS creator_name, c.organization_name, \
    l.name AS location_name, et.name AS event_type_name, \
    ent.name AS entrance_type_name";

/// Event joins needed by [`EVENT_COLUMNS`] and by search over creator names.
pub const EVENT_FROM: &str = "\
    FROM events e \
    JOIN creators c ON e.creator_id = c.id \
    JOIN locations l ON e.location_id = l.id \
    JOIN event_types et ON e.event_type_id = et.id \
    JOIN entrance_types ent ON e.entrance_type_id = ent.id";

/// Listing order for events.
pub const EVENT_ORDER: &str = " ORDER BY e.event_date ASC, e.created_at DESC, e.id ASC";

/// Joined payment columns, aliased to match the payment row struct.
pub const PAYMENT_COLUMNS: &str = "\
    p.id, p.event_id, p.creator_id, p.stripe_session_id, \
    p.stripe_payment_intent_id, p.amount_cents, p.currency, p.status, \
    p.created_at, p.updated_at, \
    e.title AS event_title, c.name AS creator_name";

/// Payment joins needed by [`PAYMENT_COLUMNS`].
pub const PAYMENT_FROM: &str = "\
    FROM payments p \
    JOIN events e ON p.event_id = e.id \
    JOIN creators c ON p.creator_id = c.id";

/// Creator columns read by the account queries.
pub const CREATOR_COLUMNS: &str = "id, name, organization_name, email, is_active, created_at";

/// Columns of every reference table.
pub const REFERENCE_COLUMNS: &str = "id, name, slug, is_active";

/// Seed locations.
pub const SEED_LOCATIONS: &[&str] = &[
    "Canggu",
    "Seminyak",
    "Ubud",
    "Uluwatu",
    "Sanur",
    "Amed",
    "Sidemen",
];

/// Seed event types.
pub const SEED_EVENT_TYPES: &[&str] = &[
    "Yoga",
    "Meditation",
    "Sound Healing",
    "Breathwork",
    "Ecstatic Dance",
    "Workshop",
    "Retreat",
    "Ceremony",
];

/// Seed entrance types.
pub const SEED_ENTRANCE_TYPES: &[&str] = &["Free", "Paid", "Donation"];

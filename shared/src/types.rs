use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::postgres::PgRow;
use utoipa::ToSchema;
use uuid::Uuid;

// region: Listing identity

/// Which kind of rentable listing an entity belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    Vehicle,
    Driver,
}

impl ListingType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vehicle => "vehicle",
            Self::Driver => "driver",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "vehicle" => Some(Self::Vehicle),
            "driver" => Some(Self::Driver),
            _ => None,
        }
    }
}

impl std::fmt::Display for ListingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A listing reference: the single place where vehicle-vs-driver branching
/// is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListingRef {
    pub kind: ListingType,
    pub id: Uuid,
}

impl ListingRef {
    pub fn new(kind: ListingType, id: Uuid) -> Self {
        Self { kind, id }
    }
}

impl std::fmt::Display for ListingRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

// endregion: Listing identity

// region: Booking (read-only collaborator)

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Active,
    Completed,
    Cancelled,
    Declined,
}

impl BookingStatus {
    /// Statuses that make a booking count as a conflict source.
    pub const CONFLICT_SOURCES: [Self; 3] = [Self::Accepted, Self::Active, Self::Completed];

    pub fn is_conflict_source(self) -> bool {
        Self::CONFLICT_SOURCES.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Declined => "DECLINED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "ACCEPTED" => Some(Self::Accepted),
            "ACTIVE" => Some(Self::Active),
            "COMPLETED" => Some(Self::Completed),
            "CANCELLED" => Some(Self::Cancelled),
            "DECLINED" => Some(Self::Declined),
            _ => None,
        }
    }
}

/// A booking row. Written by the booking service; read-only here.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Booking {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub listing_type: ListingType,
    pub booking_number: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: BookingStatus,
}

// endregion: Booking (read-only collaborator)

// region: Availability entities

/// A one-off contiguous unavailability window for one listing.
///
/// Dates are day-granularity and inclusive on both ends.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AvailabilityBlock {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub listing_type: ListingType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub is_recurring: bool,
    pub recurring_pattern_id: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AvailabilityBlock {
    pub fn listing(&self) -> ListingRef {
        ListingRef::new(self.listing_type, self.listing_id)
    }
}

/// A weekly repeating unavailability rule. Instances are expanded at query
/// time, never stored one row per day.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecurringPattern {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub listing_type: ListingType,
    /// Weekdays the rule fires on, Sunday = 0 through Saturday = 6.
    pub days_of_week: Vec<i16>,
    pub start_date: NaiveDate,
    /// `None` means open-ended.
    pub end_date: Option<NaiveDate>,
    pub reason: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecurringPattern {
    pub fn listing(&self) -> ListingRef {
        ListingRef::new(self.listing_type, self.listing_id)
    }
}

// endregion: Availability entities

// region: Transient result values

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConflictKind {
    Booking,
    Block,
}

/// One overlap between a candidate range and an existing booking or block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ConflictDescriptor {
    #[serde(rename = "type")]
    pub kind: ConflictKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reference_id: Uuid,
    pub reference_label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AvailabilityCheck {
    pub available: bool,
    pub conflicts: Vec<ConflictDescriptor>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    Available,
    Blocked,
    Booked,
}

/// The resolved status of one calendar day for a listing. Only the
/// highest-precedence match contributes `reference_id`/`detail`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub status: DayStatus,
    pub reference_id: Option<Uuid>,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CalendarAnalytics {
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub total_days: u32,
    pub booked_days: u32,
    pub blocked_days: u32,
    pub available_days: u32,
    /// Booked share of the window, in `[0.0, 1.0]`.
    pub occupancy_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkBlockFailure {
    pub listing_id: Uuid,
    pub reason: String,
    pub conflicts: Vec<ConflictDescriptor>,
}

/// Per-listing outcome of a bulk block request, in input order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkBlockResult {
    pub successful_listing_ids: Vec<Uuid>,
    pub failures: Vec<BulkBlockFailure>,
}

// endregion: Transient result values

// region: Row decoding

fn decode_error(column: &str, message: String) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_owned(),
        source: message.into(),
    }
}

fn listing_type_column(row: &PgRow) -> Result<ListingType, sqlx::Error> {
    let raw: String = row.try_get("listing_type")?;
    ListingType::parse(&raw)
        .ok_or_else(|| decode_error("listing_type", format!("unknown listing type `{raw}`")))
}

impl sqlx::FromRow<'_, PgRow> for AvailabilityBlock {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            listing_id: row.try_get("listing_id")?,
            listing_type: listing_type_column(row)?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            reason: row.try_get("reason")?,
            is_recurring: row.try_get("is_recurring")?,
            recurring_pattern_id: row.try_get("recurring_pattern_id")?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl sqlx::FromRow<'_, PgRow> for RecurringPattern {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            listing_id: row.try_get("listing_id")?,
            listing_type: listing_type_column(row)?,
            days_of_week: row.try_get("days_of_week")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            reason: row.try_get("reason")?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl sqlx::FromRow<'_, PgRow> for Booking {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let raw_status: String = row.try_get("status")?;
        let status = BookingStatus::parse(&raw_status).ok_or_else(|| {
            decode_error("status", format!("unknown booking status `{raw_status}`"))
        })?;

        Ok(Self {
            id: row.try_get("id")?,
            listing_id: row.try_get("listing_id")?,
            listing_type: listing_type_column(row)?,
            booking_number: row.try_get("booking_number")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            status,
        })
    }
}

// endregion: Row decoding

use std::path::Path;
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use chrono_tz::Tz;
use serde::Deserialize;
use uuid::Uuid;

use shared::types::{
    AvailabilityBlock, AvailabilityCheck, Booking, BulkBlockFailure, BulkBlockResult,
    CalendarAnalytics, CalendarDay, ListingRef, RecurringPattern,
};

use crate::domain::block::{BlockRepository, BulkBlockRequest, NewBlock};
use crate::domain::booking::BookingRepository;
use crate::domain::recurring::{
    EditScope, NewRecurringPattern, RecurringPatternChanges, RecurringPatternRepository,
};
use crate::domain::{calendar, conflict, ical};
use crate::error::AvailabilityServiceError;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AvailabilityConfig {
    pub timezone: String,
    /// Days ahead covered by the default calendar window.
    pub calendar_horizon_days: u32,
    /// Days back covered by the default analytics window.
    pub analytics_window_days: u32,
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            calendar_horizon_days: 90,
            analytics_window_days: 30,
        }
    }
}

impl AvailabilityConfig {
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        if !Path::new(path).exists() {
            tracing::info!("Config file not found at {path}, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        tracing::info!(?config, "Loaded availability config from {path}");
        Ok(config)
    }

    pub fn timezone(&self) -> Tz {
        self.timezone.parse::<Tz>().unwrap_or_else(|_| {
            tracing::warn!(
                timezone = %self.timezone,
                "Invalid timezone, falling back to UTC"
            );
            Tz::UTC
        })
    }
}

/// The availability and booking-conflict engine.
///
/// Stateless per call: every operation is a pure computation over one round
/// of repository reads, optionally followed by a write. Two concurrent
/// `create_block` calls on the same listing may both pass the conflict gate
/// before either commits; closing that race needs a storage-level exclusion
/// constraint.
pub struct AvailabilityService {
    block_repo: Arc<dyn BlockRepository>,
    recurring_repo: Arc<dyn RecurringPatternRepository>,
    booking_repo: Arc<dyn BookingRepository>,
    config: AvailabilityConfig,
}

impl AvailabilityService {
    pub fn new(
        block_repo: Arc<dyn BlockRepository>,
        recurring_repo: Arc<dyn RecurringPatternRepository>,
        booking_repo: Arc<dyn BookingRepository>,
        config: AvailabilityConfig,
    ) -> Self {
        Self {
            block_repo,
            recurring_repo,
            booking_repo,
            config,
        }
    }

    fn today(&self) -> NaiveDate {
        shared::time::today_in(self.config.timezone())
    }

    /// Default calendar/export window: today through today + horizon.
    fn default_calendar_window(&self) -> Result<(NaiveDate, NaiveDate), AvailabilityServiceError> {
        let today = self.today();
        let end = today
            .checked_add_days(Days::new(u64::from(self.config.calendar_horizon_days)))
            .ok_or_else(|| {
                AvailabilityServiceError::BadRequest("calendar window out of range".to_string())
            })?;
        Ok((today, end))
    }

    /// Default analytics window: the trailing N days ending today.
    fn default_analytics_window(&self) -> Result<(NaiveDate, NaiveDate), AvailabilityServiceError> {
        let today = self.today();
        let start = today
            .checked_sub_days(Days::new(u64::from(self.config.analytics_window_days)))
            .ok_or_else(|| {
                AvailabilityServiceError::BadRequest("analytics window out of range".to_string())
            })?;
        Ok((start, today))
    }

    /// One round of reads: everything that can make a day unavailable.
    async fn load_window(
        &self,
        listing: ListingRef,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<
        (Vec<Booking>, Vec<AvailabilityBlock>, Vec<RecurringPattern>),
        AvailabilityServiceError,
    > {
        let bookings = self
            .booking_repo
            .find_active_overlapping(listing, start, end)
            .await?;
        let blocks = self.block_repo.find_overlapping(listing, start, end).await?;
        let patterns = self
            .recurring_repo
            .find_overlapping(listing, start, end)
            .await?;
        Ok((bookings, blocks, patterns))
    }

    /// Read-only conflict check for `[start, end]`. Idempotent.
    #[tracing::instrument(skip(self))]
    pub async fn check_availability(
        &self,
        listing: ListingRef,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<AvailabilityCheck, AvailabilityServiceError> {
        validate_range(start, end)?;

        let (bookings, blocks, patterns) = self.load_window(listing, start, end).await?;
        let conflicts = conflict::collect_conflicts(start, end, &bookings, &blocks, &patterns);

        Ok(AvailabilityCheck {
            available: conflicts.is_empty(),
            conflicts,
        })
    }

    /// Creates a one-off block. Gated on bookings only: overlapping blocks
    /// are legal, an overlapping active booking fails with the conflict
    /// list attached.
    #[tracing::instrument(skip(self))]
    pub async fn create_block(
        &self,
        block: NewBlock,
    ) -> Result<AvailabilityBlock, AvailabilityServiceError> {
        validate_range(block.start_date, block.end_date)?;

        let bookings = self
            .booking_repo
            .find_active_overlapping(block.listing, block.start_date, block.end_date)
            .await?;
        let conflicts = conflict::booking_conflicts(block.start_date, block.end_date, &bookings);
        if !conflicts.is_empty() {
            return Err(AvailabilityServiceError::BookingConflict(conflicts));
        }

        self.block_repo.insert(block).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_blocks(
        &self,
        listing: ListingRef,
        window: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<AvailabilityBlock>, AvailabilityServiceError> {
        match window {
            Some((start, end)) => {
                validate_range(start, end)?;
                self.block_repo.find_overlapping(listing, start, end).await
            }
            None => self.block_repo.find_for_listing(listing).await,
        }
    }

    /// Deletes a block and returns it. The engine enforces creator-match at
    /// minimum; company-ownership checks happen upstream.
    #[tracing::instrument(skip(self))]
    pub async fn delete_block(
        &self,
        id: Uuid,
        requested_by: Uuid,
    ) -> Result<AvailabilityBlock, AvailabilityServiceError> {
        let block = self
            .block_repo
            .find_by_id(id)
            .await?
            .ok_or(AvailabilityServiceError::BlockNotFound(id))?;

        require_creator(block.created_by, requested_by, "block")?;
        self.block_repo.delete(id).await?;

        Ok(block)
    }

    /// Creates a recurring pattern. No conflict check at creation time;
    /// conflicts surface later via `check_availability`.
    #[tracing::instrument(skip(self))]
    pub async fn create_recurring_block(
        &self,
        pattern: NewRecurringPattern,
    ) -> Result<RecurringPattern, AvailabilityServiceError> {
        validate_days_of_week(&pattern.days_of_week)?;
        if let Some(end) = pattern.end_date {
            validate_range(pattern.start_date, end)?;
        }

        self.recurring_repo.insert(pattern).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_recurring_blocks(
        &self,
        listing: ListingRef,
    ) -> Result<Vec<RecurringPattern>, AvailabilityServiceError> {
        self.recurring_repo.find_for_listing(listing).await
    }

    /// Updates a recurring pattern.
    ///
    /// Scope `all` mutates the series in place and returns it. Scope
    /// `future` caps the original at the day before `update_date`, then
    /// creates and returns a new pattern starting at `update_date` that
    /// carries unset fields over from the original; both steps commit
    /// together. Past instances are untouched. A series that already ends
    /// before `update_date` has no occurrences to rewrite and is returned
    /// unchanged.
    #[tracing::instrument(skip(self))]
    pub async fn update_recurring_block(
        &self,
        id: Uuid,
        requested_by: Uuid,
        scope: EditScope,
        update_date: Option<NaiveDate>,
        changes: RecurringPatternChanges,
    ) -> Result<RecurringPattern, AvailabilityServiceError> {
        let existing = self
            .recurring_repo
            .find_by_id(id)
            .await?
            .ok_or(AvailabilityServiceError::RecurringBlockNotFound(id))?;

        require_creator(existing.created_by, requested_by, "recurring block")?;
        if let Some(days) = &changes.days_of_week {
            validate_days_of_week(days)?;
        }

        match scope {
            EditScope::All => {
                if let Some(end) = changes.end_date {
                    validate_range(existing.start_date, end)?;
                }
                self.recurring_repo.update(id, changes).await
            }
            EditScope::Future => {
                let effective = update_date.ok_or_else(|| {
                    AvailabilityServiceError::BadRequest(
                        "update_date is required for scope=future".to_string(),
                    )
                })?;
                if existing.end_date.is_some_and(|end| end < effective) {
                    // no occurrences on or after the effective date
                    return Ok(existing);
                }
                let cutoff = day_before(effective)?;

                let replacement = NewRecurringPattern {
                    listing: existing.listing(),
                    days_of_week: changes
                        .days_of_week
                        .unwrap_or_else(|| existing.days_of_week.clone()),
                    start_date: effective,
                    end_date: changes.end_date.or(existing.end_date),
                    reason: changes.reason.or_else(|| existing.reason.clone()),
                    created_by: existing.created_by,
                };
                if let Some(end) = replacement.end_date {
                    validate_range(replacement.start_date, end)?;
                }
                self.recurring_repo.split(id, cutoff, replacement).await
            }
        }
    }

    /// Deletes a recurring pattern and returns it as found.
    ///
    /// Scope `all` removes the pattern and any materialized instances.
    /// Scope `future` caps the series at the day before `delete_date`,
    /// never extending it: a series already ended before `delete_date` is
    /// left untouched, and one with no occurrences before `delete_date` is
    /// removed outright.
    #[tracing::instrument(skip(self))]
    pub async fn delete_recurring_block(
        &self,
        id: Uuid,
        requested_by: Uuid,
        scope: EditScope,
        delete_date: Option<NaiveDate>,
    ) -> Result<RecurringPattern, AvailabilityServiceError> {
        let existing = self
            .recurring_repo
            .find_by_id(id)
            .await?
            .ok_or(AvailabilityServiceError::RecurringBlockNotFound(id))?;

        require_creator(existing.created_by, requested_by, "recurring block")?;

        if scope == EditScope::Future {
            let effective = delete_date.ok_or_else(|| {
                AvailabilityServiceError::BadRequest(
                    "delete_date is required for scope=future".to_string(),
                )
            })?;
            if existing.end_date.is_some_and(|end| end < effective) {
                // already ends before the cutoff; nothing to remove
                return Ok(existing);
            }
            if effective > existing.start_date {
                let cutoff = day_before(effective)?;
                self.recurring_repo.truncate(id, cutoff).await?;
                return Ok(existing);
            }
            // no occurrences precede the cutoff; remove the whole series
        }

        let removed = self.block_repo.delete_by_pattern_id(id).await?;
        if removed > 0 {
            tracing::info!(pattern_id = %id, removed, "Removed materialized instances");
        }
        self.recurring_repo.delete(id).await?;

        Ok(existing)
    }

    /// Applies one block request across many listings, isolating per-listing
    /// failures. The date range is a global precondition; after that, one
    /// listing's failure never aborts the rest, and result order matches
    /// input order.
    #[tracing::instrument(skip(self), fields(listings = request.listing_ids.len()))]
    pub async fn create_bulk_blocks(
        &self,
        request: BulkBlockRequest,
    ) -> Result<BulkBlockResult, AvailabilityServiceError> {
        validate_range(request.start_date, request.end_date)?;

        let mut successful_listing_ids = Vec::new();
        let mut failures = Vec::new();

        for listing_id in &request.listing_ids {
            let block = NewBlock {
                listing: ListingRef::new(request.listing_type, *listing_id),
                start_date: request.start_date,
                end_date: request.end_date,
                reason: request.reason.clone(),
                created_by: request.created_by,
            };

            match self.create_block(block).await {
                Ok(_) => successful_listing_ids.push(*listing_id),
                Err(AvailabilityServiceError::BookingConflict(conflicts)) => {
                    failures.push(BulkBlockFailure {
                        listing_id: *listing_id,
                        reason: "BOOKING_CONFLICT".to_string(),
                        conflicts,
                    });
                }
                Err(e) => {
                    tracing::warn!(listing_id = %listing_id, error = %e, "Bulk block item failed");
                    failures.push(BulkBlockFailure {
                        listing_id: *listing_id,
                        reason: e.code().to_string(),
                        conflicts: Vec::new(),
                    });
                }
            }
        }

        Ok(BulkBlockResult {
            successful_listing_ids,
            failures,
        })
    }

    /// Renders the day-by-day calendar. Defaults to today through
    /// today + the configured horizon when no window is given.
    #[tracing::instrument(skip(self))]
    pub async fn build_calendar(
        &self,
        listing: ListingRef,
        window: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<CalendarDay>, AvailabilityServiceError> {
        let (start, end) = match window {
            Some(w) => w,
            None => self.default_calendar_window()?,
        };
        validate_range(start, end)?;

        let (bookings, blocks, patterns) = self.load_window(listing, start, end).await?;
        Ok(calendar::render_days(start, end, &bookings, &blocks, &patterns))
    }

    /// Occupancy statistics over a window; defaults to the trailing
    /// configured number of days.
    #[tracing::instrument(skip(self))]
    pub async fn get_analytics(
        &self,
        listing: ListingRef,
        window: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<CalendarAnalytics, AvailabilityServiceError> {
        let (start, end) = match window {
            Some(w) => w,
            None => self.default_analytics_window()?,
        };

        let days = self.build_calendar(listing, Some((start, end))).await?;
        Ok(calendar::summarize(start, end, &days))
    }

    /// Serializes the calendar window to an iCalendar document.
    #[tracing::instrument(skip(self))]
    pub async fn export_calendar(
        &self,
        listing: ListingRef,
        window: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<String, AvailabilityServiceError> {
        let days = self.build_calendar(listing, window).await?;
        Ok(ical::render_ical(listing, &days, chrono::Utc::now()))
    }
}

fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<(), AvailabilityServiceError> {
    if start > end {
        return Err(AvailabilityServiceError::InvalidDateRange(format!(
            "start_date {start} is after end_date {end}"
        )));
    }
    Ok(())
}

fn validate_days_of_week(days: &[i16]) -> Result<(), AvailabilityServiceError> {
    if days.is_empty() {
        return Err(AvailabilityServiceError::InvalidDaysOfWeek(
            "days_of_week must not be empty".to_string(),
        ));
    }
    if let Some(bad) = days.iter().find(|d| !(0..=6).contains(*d)) {
        return Err(AvailabilityServiceError::InvalidDaysOfWeek(format!(
            "day {bad} is outside 0..=6 (Sunday = 0)"
        )));
    }
    Ok(())
}

fn require_creator(
    created_by: Uuid,
    requested_by: Uuid,
    what: &str,
) -> Result<(), AvailabilityServiceError> {
    if created_by != requested_by {
        return Err(AvailabilityServiceError::Unauthorized(format!(
            "requester {requested_by} did not create this {what}"
        )));
    }
    Ok(())
}

fn day_before(date: NaiveDate) -> Result<NaiveDate, AvailabilityServiceError> {
    date.pred_opt().ok_or_else(|| {
        AvailabilityServiceError::InvalidDateRange(format!("no day precedes {date}"))
    })
}

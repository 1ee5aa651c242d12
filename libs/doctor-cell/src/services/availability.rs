use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::{debug, info};

use shared_config::{AppConfig, MAX_AVAILABILITY_WINDOW_DAYS};
use shared_database::repository::availability::{self, NewSlot};
use shared_database::repository::doctors;
use shared_database::{AppState, Database};
use shared_models::AvailabilitySlot;

use crate::models::{AvailabilityError, AvailabilityOverview, SlotSelection, TimeBand};

/// Publishing and lookup of per-doctor open slots.
pub struct AvailabilityService {
    db: Database,
    config: Arc<AppConfig>,
}

impl AvailabilityService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
            config: state.config.clone(),
        }
    }

    /// Replace every slot of `doctor_id` with `selections`.
    ///
    /// The whole set is parsed before anything is written, and the delete and
    /// inserts share one transaction. Two publishes racing for the same doctor
    /// are serialized by the store: the later one wins in full and nothing from
    /// the earlier one survives.
    pub async fn publish_availability(
        &self,
        doctor_id: i64,
        selections: &[String],
    ) -> Result<Vec<AvailabilitySlot>, AvailabilityError> {
        debug!("Publishing {} slot selections for doctor {}", selections.len(), doctor_id);

        let slots: BTreeSet<SlotSelection> = selections
            .iter()
            .map(|raw| raw.trim().parse::<SlotSelection>())
            .collect::<Result<_, _>>()?;
        let slots: Vec<NewSlot> = slots.into_iter().map(NewSlot::from).collect();

        let published = self
            .db
            .transaction(|conn| {
                if doctors::get_doctor(conn, doctor_id)?.is_none() {
                    return Err(AvailabilityError::DoctorNotFound);
                }
                availability::replace_for_doctor(conn, doctor_id, &slots)?;
                Ok(availability::list_open(conn, doctor_id)?)
            })
            .await?;

        info!("Doctor {} published {} open slots", doctor_id, published.len());
        Ok(published)
    }

    /// Open slots of a doctor that patients may see, ordered by date then band.
    pub async fn list_open_slots(&self, doctor_id: i64) -> Result<Vec<AvailabilitySlot>, AvailabilityError> {
        self.db
            .call(|conn| {
                if doctors::get_visible_summary(conn, doctor_id)?.is_none() {
                    return Err(AvailabilityError::DoctorNotFound);
                }
                Ok(availability::list_open(conn, doctor_id)?)
            })
            .await
    }

    /// The dates a doctor may publish for, starting at `today`, with the
    /// bands and the slots currently open.
    pub async fn overview(
        &self,
        doctor_id: i64,
        today: NaiveDate,
    ) -> Result<AvailabilityOverview, AvailabilityError> {
        let open_slots = self
            .db
            .call(|conn| availability::list_open(conn, doctor_id))
            .await?;

        Ok(AvailabilityOverview {
            doctor_id,
            dates: publish_window(today, self.config.availability_window_days),
            time_bands: TimeBand::ALL.into_iter().map(Into::into).collect(),
            open_slots,
        })
    }
}

/// `today` and the following days, at most [`MAX_AVAILABILITY_WINDOW_DAYS`]
/// long. Stops early at the end of the calendar.
pub fn publish_window(today: NaiveDate, days: i64) -> Vec<NaiveDate> {
    (0..days.clamp(0, MAX_AVAILABILITY_WINDOW_DAYS))
        .map_while(|offset| today.checked_add_signed(Duration::try_days(offset)?))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_starts_today() {
        let today = NaiveDate::from_ymd_opt(2025, 12, 29).unwrap();
        let window = publish_window(today, 7);
        assert_eq!(window.len(), 7);
        assert_eq!(window[0], today);
        assert_eq!(window[6], NaiveDate::from_ymd_opt(2026, 1, 4).unwrap());
    }

    #[test]
    fn oversized_window_is_capped() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(publish_window(today, i64::MAX).len() as i64, MAX_AVAILABILITY_WINDOW_DAYS);
    }

    #[test]
    fn window_stops_at_end_of_calendar() {
        let window = publish_window(NaiveDate::MAX, 7);
        assert_eq!(window, vec![NaiveDate::MAX]);
    }

    #[test]
    fn empty_window_for_non_positive_days() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert!(publish_window(today, 0).is_empty());
        assert!(publish_window(today, -3).is_empty());
    }
}

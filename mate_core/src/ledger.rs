//! In-memory intake ledger and its derived quantities.
//!
//! The ledger holds every drink recorded during the process lifetime, oldest
//! first. Every query takes `now` explicitly; the calendar day of `now` in its
//! own time zone decides what counts as "today".

use crate::calendar::day_start;
use crate::decay::{elapsed_hours, remaining_dose};
use crate::{ConsumptionEvent, IntakeConfig, IntakeSummary, Result, ThresholdState};
use chrono::{DateTime, TimeZone, Utc};

/// Chronological record of drinks plus the parameters used to evaluate it
#[derive(Clone, Debug)]
pub struct Ledger {
    settings: IntakeConfig,
    events: Vec<ConsumptionEvent>,
}

impl Ledger {
    /// Create an empty ledger
    ///
    /// `settings` must already be valid (see [`IntakeConfig::validate`]); a
    /// zero half-life makes every residual NaN. Use [`Ledger::try_new`] for
    /// settings that did not come through [`crate::Config::load_from`].
    pub fn new(settings: IntakeConfig) -> Self {
        Self {
            settings,
            events: Vec::new(),
        }
    }

    /// Create an empty ledger after validating `settings`
    pub fn try_new(settings: IntakeConfig) -> Result<Self> {
        settings.validate()?;
        Ok(Self::new(settings))
    }

    pub fn settings(&self) -> &IntakeConfig {
        &self.settings
    }

    /// All recorded events, oldest first
    pub fn events(&self) -> &[ConsumptionEvent] {
        &self.events
    }

    /// Record one drink at `now` with the configured dose
    pub fn add_event<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) {
        let event = ConsumptionEvent::new(now.with_timezone(&Utc), self.settings.dose_mg);
        tracing::debug!(
            "Recorded {} mg at {}",
            event.dose_mg,
            event.occurred_at.to_rfc3339()
        );
        self.events.push(event);
    }

    /// Estimated caffeine still in the body at `now`, across all days
    pub fn residual_caffeine<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> f64 {
        let now = now.with_timezone(&Utc);
        self.events
            .iter()
            .map(|event| {
                let hours = elapsed_hours(event.occurred_at, now);
                remaining_dose(event.dose_mg, hours, self.settings.half_life_hours)
            })
            .sum()
    }

    /// Raw (undecayed) intake since local midnight of `now`
    pub fn today_total_intake<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> f64 {
        let start = day_start(now);
        self.events_since(start).map(|event| event.dose_mg).sum()
    }

    /// Number of drinks since local midnight of `now`
    pub fn today_event_count<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> usize {
        let start = day_start(now);
        self.events_since(start).count()
    }

    /// Daily maximum minus today's intake; negative once over the limit
    pub fn remaining_allowance<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> f64 {
        self.settings.max_daily_mg - self.today_total_intake(now)
    }

    pub fn threshold_state<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> ThresholdState {
        ThresholdState::classify(
            self.today_total_intake(now),
            self.residual_caffeine(now),
            self.settings.max_daily_mg,
        )
    }

    /// Drop today's events, keeping earlier days for the residual estimate
    ///
    /// Returns how many events were removed. Calling it again without adding
    /// anything removes nothing.
    pub fn reset_today<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> usize {
        let start = day_start(now);
        let before = self.events.len();
        self.events.retain(|event| event.occurred_at < start);
        let removed = before - self.events.len();

        tracing::info!(
            "Reset today's entries: removed {}, kept {} from earlier days",
            removed,
            self.events.len()
        );
        removed
    }

    /// Evaluate every derived quantity for the same instant
    pub fn summary<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> IntakeSummary {
        let total_today_mg = self.today_total_intake(now);
        let residual_mg = self.residual_caffeine(now);

        IntakeSummary {
            evaluated_at: now.with_timezone(&Utc),
            event_count_today: self.today_event_count(now),
            total_today_mg,
            remaining_allowance_mg: self.settings.max_daily_mg - total_today_mg,
            residual_mg,
            state: ThresholdState::classify(
                total_today_mg,
                residual_mg,
                self.settings.max_daily_mg,
            ),
        }
    }

    fn events_since(&self, start: DateTime<Utc>) -> impl Iterator<Item = &ConsumptionEvent> {
        self.events
            .iter()
            .filter(move |event| event.occurred_at >= start)
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(IntakeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use chrono::{Duration, FixedOffset};
    use chrono_tz::America::Sao_Paulo;

    fn at(hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, hour, min, sec).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_empty_ledger() {
        let ledger = Ledger::default();
        let now = at(12, 0, 0);

        assert_eq!(ledger.residual_caffeine(&now), 0.0);
        assert_eq!(ledger.today_total_intake(&now), 0.0);
        assert_eq!(ledger.today_event_count(&now), 0);
        assert_eq!(ledger.remaining_allowance(&now), 400.0);
        assert_eq!(ledger.threshold_state(&now), ThresholdState::Normal);
    }

    #[test]
    fn test_add_event_uses_configured_dose() {
        crate::logging::init_test();

        let mut ledger = Ledger::new(IntakeConfig {
            dose_mg: 80.0,
            ..IntakeConfig::default()
        });
        let now = at(9, 15, 0);
        ledger.add_event(&now);

        assert_eq!(ledger.events().len(), 1);
        assert_eq!(ledger.events()[0], ConsumptionEvent::new(now, 80.0));
    }

    #[test]
    fn test_fresh_event_contributes_full_dose() {
        let mut ledger = Ledger::default();
        let now = at(10, 0, 0);
        ledger.add_event(&now);

        assert_eq!(ledger.residual_caffeine(&now), 100.0);
    }

    #[test]
    fn test_residual_halves_each_half_life() {
        let mut ledger = Ledger::default();
        let t0 = at(6, 0, 0);
        ledger.add_event(&t0);

        assert!(close(ledger.residual_caffeine(&(t0 + Duration::hours(5))), 50.0));
        assert!(close(ledger.residual_caffeine(&(t0 + Duration::hours(10))), 25.0));
    }

    #[test]
    fn test_residual_before_event_does_not_grow() {
        let mut ledger = Ledger::default();
        let t0 = at(14, 0, 0);
        ledger.add_event(&t0);

        assert_eq!(ledger.residual_caffeine(&(t0 - Duration::hours(2))), 100.0);
    }

    #[test]
    fn test_residual_is_non_increasing() {
        let mut ledger = Ledger::default();
        let t0 = at(7, 0, 0);
        ledger.add_event(&t0);
        ledger.add_event(&(t0 + Duration::minutes(45)));
        ledger.add_event(&(t0 + Duration::hours(3)));

        let mut previous = ledger.residual_caffeine(&t0);
        for minutes in (0..24 * 60).step_by(17) {
            let current = ledger.residual_caffeine(&(t0 + Duration::minutes(minutes)));
            assert!(current <= previous + 1e-9, "grew at minute {}", minutes);
            previous = current;
        }
    }

    #[test]
    fn test_five_drinks_exceed_limit() {
        let mut ledger = Ledger::default();
        let t0 = at(8, 0, 0);
        for _ in 0..5 {
            ledger.add_event(&t0);
        }

        assert_eq!(ledger.today_total_intake(&t0), 500.0);
        assert_eq!(ledger.today_event_count(&t0), 5);
        assert_eq!(ledger.remaining_allowance(&t0), -100.0);
        assert_eq!(ledger.threshold_state(&t0), ThresholdState::Exceeded);
    }

    #[test]
    fn test_remaining_allowance_is_exact() {
        let mut ledger = Ledger::new(IntakeConfig {
            dose_mg: 33.3,
            max_daily_mg: 100.0,
            half_life_hours: 5.0,
        });
        let now = at(11, 0, 0);
        for _ in 0..4 {
            ledger.add_event(&now);
        }

        let total = ledger.today_total_intake(&now);
        assert_eq!(ledger.remaining_allowance(&now), 100.0 - total);
        assert!(ledger.remaining_allowance(&now) < 0.0);
    }

    #[test]
    fn test_event_just_before_midnight_is_yesterday() {
        let mut ledger = Ledger::default();
        let late = Utc.with_ymd_and_hms(2026, 10, 18, 23, 59, 59).unwrap();
        ledger.add_event(&late);

        let now = at(0, 30, 0);
        assert_eq!(ledger.today_total_intake(&now), 0.0);
        assert_eq!(ledger.today_event_count(&now), 0);
        assert!(ledger.residual_caffeine(&now) > 0.0);
    }

    #[test]
    fn test_event_at_midnight_is_today() {
        let mut ledger = Ledger::default();
        ledger.add_event(&at(0, 0, 0));

        let now = at(18, 0, 0);
        assert_eq!(ledger.today_event_count(&now), 1);
        assert_eq!(ledger.today_total_intake(&now), 100.0);
    }

    #[test]
    fn test_only_yesterday_counts_toward_residual() {
        let mut ledger = Ledger::default();
        let yesterday = Utc.with_ymd_and_hms(2026, 10, 18, 16, 0, 0).unwrap();
        ledger.add_event(&yesterday);

        let now = at(8, 0, 0);
        let summary = ledger.summary(&now);
        assert_eq!(summary.total_today_mg, 0.0);
        assert_eq!(summary.event_count_today, 0);
        assert!(summary.residual_mg > 0.0);
        assert!(summary.residual_mg < 100.0);
    }

    #[test]
    fn test_today_follows_time_zone_of_now() {
        let mut ledger = Ledger::default();
        // 23:00 UTC on the 18th is 01:00 on the 19th in UTC+2
        ledger.add_event(&Utc.with_ymd_and_hms(2026, 10, 18, 23, 0, 0).unwrap());

        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let local_now = tz.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
        let utc_now = local_now.with_timezone(&Utc);

        assert_eq!(ledger.today_event_count(&local_now), 1);
        assert_eq!(ledger.today_event_count(&utc_now), 0);
    }

    #[test]
    fn test_reset_today_keeps_earlier_days() {
        crate::logging::init_test();

        let mut ledger = Ledger::default();
        let yesterday = Utc.with_ymd_and_hms(2026, 10, 18, 20, 0, 0).unwrap();
        ledger.add_event(&yesterday);
        ledger.add_event(&at(8, 0, 0));
        ledger.add_event(&at(10, 0, 0));

        let now = at(12, 0, 0);
        let removed = ledger.reset_today(&now);

        assert_eq!(removed, 2);
        assert_eq!(ledger.events(), &[ConsumptionEvent::new(yesterday, 100.0)]);
        assert_eq!(ledger.today_total_intake(&now), 0.0);
        assert!(ledger.residual_caffeine(&now) > 0.0);
    }

    #[test]
    fn test_reset_today_is_idempotent() {
        let mut ledger = Ledger::default();
        ledger.add_event(&Utc.with_ymd_and_hms(2026, 10, 18, 21, 0, 0).unwrap());
        ledger.add_event(&at(9, 0, 0));

        let now = at(13, 0, 0);
        ledger.reset_today(&now);
        let after_first = ledger.events().to_vec();

        assert_eq!(ledger.reset_today(&now), 0);
        assert_eq!(ledger.events(), after_first.as_slice());
    }

    #[test]
    fn test_threshold_from_residual_alone() {
        // Yesterday's late intake still above 80% of the max at 00:10
        let mut ledger = Ledger::default();
        let late = Utc.with_ymd_and_hms(2026, 10, 18, 23, 50, 0).unwrap();
        for _ in 0..4 {
            ledger.add_event(&late);
        }

        let now = at(0, 10, 0);
        assert_eq!(ledger.today_total_intake(&now), 0.0);
        assert!(ledger.residual_caffeine(&now) > 320.0);
        assert_eq!(ledger.threshold_state(&now), ThresholdState::Approaching);
    }

    #[test]
    fn test_threshold_approaching_from_today_total() {
        let mut ledger = Ledger::default();
        let t0 = at(6, 0, 0);
        for _ in 0..4 {
            ledger.add_event(&t0);
        }

        // Residual has decayed below 320 but today's total is 400
        let later = t0 + Duration::hours(8);
        assert!(ledger.residual_caffeine(&later) < 320.0);
        assert_eq!(ledger.threshold_state(&later), ThresholdState::Approaching);
    }

    #[test]
    fn test_summary_matches_individual_queries() {
        let mut ledger = Ledger::default();
        ledger.add_event(&at(7, 30, 0));
        ledger.add_event(&at(11, 0, 0));
        ledger.add_event(&at(15, 45, 0));

        let now = at(17, 0, 0);
        let summary = ledger.summary(&now);

        assert_eq!(summary.evaluated_at, now);
        assert_eq!(summary.event_count_today, ledger.today_event_count(&now));
        assert_eq!(summary.total_today_mg, ledger.today_total_intake(&now));
        assert_eq!(
            summary.remaining_allowance_mg,
            ledger.remaining_allowance(&now)
        );
        assert_eq!(summary.residual_mg, ledger.residual_caffeine(&now));
        assert_eq!(summary.state, ledger.threshold_state(&now));
    }

    #[test]
    fn test_try_new_rejects_zero_half_life() {
        let result = Ledger::try_new(IntakeConfig {
            half_life_hours: 0.0,
            ..IntakeConfig::default()
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_try_new_accepts_defaults() {
        let mut ledger = Ledger::try_new(IntakeConfig::default()).unwrap();
        let now = at(9, 0, 0);
        ledger.add_event(&now);
        assert_eq!(ledger.residual_caffeine(&now), 100.0);
    }

    #[test]
    fn test_skipped_midnight_keeps_yesterday_out_of_today() {
        // Sao Paulo skipped 2018-11-04 00:00-01:00 local
        let mut ledger = Ledger::default();
        let late = Sao_Paulo.with_ymd_and_hms(2018, 11, 3, 23, 30, 0).unwrap();
        let early = Sao_Paulo.with_ymd_and_hms(2018, 11, 4, 1, 15, 0).unwrap();
        ledger.add_event(&late);
        ledger.add_event(&early);

        let now = Sao_Paulo.with_ymd_and_hms(2018, 11, 4, 12, 0, 0).unwrap();
        assert_eq!(ledger.today_event_count(&now), 1);
        assert_eq!(ledger.today_total_intake(&now), 100.0);

        assert_eq!(ledger.reset_today(&now), 1);
        assert_eq!(
            ledger.events(),
            &[ConsumptionEvent::new(late.with_timezone(&Utc), 100.0)]
        );
        assert!(ledger.residual_caffeine(&now) > 0.0);
    }
}

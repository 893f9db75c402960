//! Client-side preview of the next review interval.
//!
//! A simplified SM-2 variant that runs in hours rather than days:
//! - A lapse (Again) drops the item back to 1 hour if it was never learned,
//!   otherwise to one day, and costs 0.2 of easiness
//! - The first two successful reviews use fixed steps per grade
//! - Later reviews multiply the previous interval by the easiness factor,
//!   shortened for Hard and stretched for Easy
//! - Easiness never drops below 1.3 and intervals never exceed 60 days
//!
//! The backend owns the authoritative schedule. These numbers only label the
//! grade buttons before a grade is submitted, so nothing here mutates state.

use crate::error::{Error, Result};
use crate::models::{Grade, ReviewState};

/// Easiness factor floor.
pub const MIN_EASINESS: f64 = 1.3;

/// Longest interval a preview will show: 60 days.
pub const MAX_INTERVAL_HOURS: f64 = 1440.0;

const LAPSE_EASINESS_PENALTY: f64 = 0.2;
const FIRST_LAPSE_HOURS: f64 = 1.0;
const RELEARN_HOURS: f64 = 24.0;

const HARD_MULTIPLIER: f64 = 0.8;
const EASY_MULTIPLIER: f64 = 1.3;

/// Result of grading an item, as the client expects the backend to see it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalEstimate {
    pub interval_hours: f64,
    pub easiness_factor: f64,
    pub repetitions: u32,
}

impl IntervalEstimate {
    pub fn label(&self) -> String {
        format_interval(self.interval_hours)
    }
}

fn validate(state: &ReviewState) -> Result<()> {
    if !state.easiness_factor.is_finite() || state.easiness_factor < MIN_EASINESS {
        return Err(Error::InvalidArgument(format!(
            "easiness factor must be a number >= {MIN_EASINESS}, got {}",
            state.easiness_factor
        )));
    }
    if !state.interval_hours.is_finite() || state.interval_hours < 0.0 {
        return Err(Error::InvalidArgument(format!(
            "interval must be a non-negative number of hours, got {}",
            state.interval_hours
        )));
    }
    Ok(())
}

/// Fixed interval for the first and second successful review in a row.
fn step_hours(grade: Grade, repetitions: u32) -> Option<f64> {
    match (repetitions, grade) {
        (1, Grade::Hard) => Some(12.0),
        (1, Grade::Good) => Some(24.0),
        (1, Grade::Easy) => Some(48.0),
        (2, Grade::Hard) => Some(72.0),
        (2, Grade::Good) => Some(144.0),
        (2, Grade::Easy) => Some(288.0),
        _ => None,
    }
}

/// SM-2 easiness update. Applied to Hard as well as Good and Easy.
fn updated_easiness(easiness_factor: f64, grade: Grade) -> f64 {
    let q = 5.0 - f64::from(grade.value());
    (easiness_factor + (0.1 - q * (0.08 + q * 0.02))).max(MIN_EASINESS)
}

/// Estimates the state an item would have after being graded.
pub fn estimate(grade: Grade, state: &ReviewState) -> Result<IntervalEstimate> {
    validate(state)?;

    let ef = state.easiness_factor;

    let (interval_hours, easiness_factor, repetitions) = if grade.is_lapse() {
        let hours = if state.repetitions == 0 {
            FIRST_LAPSE_HOURS
        } else {
            RELEARN_HOURS
        };
        (hours, (ef - LAPSE_EASINESS_PENALTY).max(MIN_EASINESS), 0)
    } else {
        let repetitions = state.repetitions.saturating_add(1);
        // Growth uses the easiness before this review's update
        let hours = step_hours(grade, repetitions).unwrap_or_else(|| {
            let grown = state.interval_hours * ef;
            match grade {
                Grade::Hard => grown * HARD_MULTIPLIER,
                Grade::Easy => grown * EASY_MULTIPLIER,
                _ => grown,
            }
        });
        (hours, updated_easiness(ef, grade), repetitions)
    };

    Ok(IntervalEstimate {
        interval_hours: interval_hours.min(MAX_INTERVAL_HOURS),
        easiness_factor,
        repetitions,
    })
}

/// Label for grading with a raw numeric grade, e.g. `"2.0d"`.
pub fn estimate_next_interval(
    grade: u8,
    easiness_factor: f64,
    repetitions: u32,
    interval_hours: f64,
) -> Result<String> {
    let grade = Grade::try_from(grade)?;
    let state = ReviewState::new(easiness_factor, repetitions, interval_hours);
    Ok(estimate(grade, &state)?.label())
}

/// One label per grade, in button order.
pub fn preview_intervals(state: &ReviewState) -> Result<[(Grade, String); 4]> {
    let label = |grade| estimate(grade, state).map(|e| (grade, e.label()));
    Ok([
        label(Grade::Again)?,
        label(Grade::Hard)?,
        label(Grade::Good)?,
        label(Grade::Easy)?,
    ])
}

/// Rounds to the tenth nearest the stored value. Only a true tie, a value
/// ending in exactly .x5, goes up; in binary those are the odd quarters.
fn one_decimal(value: f64) -> String {
    let quarters = value * 4.0;
    if quarters.fract() == 0.0 && quarters % 2.0 != 0.0 {
        return format!("{:.1}", (value * 10.0).round() / 10.0);
    }
    format!("{:.1}", value)
}

/// Compact interval label: minutes, hours, days, then 30-day months.
pub fn format_interval(hours: f64) -> String {
    if hours < 1.0 {
        return format!("{}m", (hours * 60.0).round() as i64);
    }
    if hours < 24.0 {
        return format!("{}h", one_decimal(hours));
    }

    let days = hours / 24.0;
    if days < 30.0 {
        return format!("{}d", one_decimal(days));
    }

    format!("{}mo", one_decimal(days / 30.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn state(ef: f64, repetitions: u32, interval_hours: f64) -> ReviewState {
        ReviewState::new(ef, repetitions, interval_hours)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_lapse_on_new_item() {
        let next = estimate(Grade::Again, &state(2.5, 0, 0.0)).unwrap();
        assert_eq!(next.interval_hours, 1.0);
        assert_eq!(next.repetitions, 0);
        assert!(approx(next.easiness_factor, 2.3));
        assert_eq!(next.label(), "1.0h");
    }

    #[test]
    fn test_lapse_after_streak() {
        let next = estimate(Grade::Again, &state(2.5, 3, 50.0)).unwrap();
        assert_eq!(next.interval_hours, 24.0);
        assert_eq!(next.repetitions, 0);
        assert!(approx(next.easiness_factor, 2.3));
        assert_eq!(next.label(), "1.0d");
        assert_eq!(estimate_next_interval(1, 2.5, 3, 50.0).unwrap(), "1.0d");
    }

    #[test]
    fn test_lapse_floors_easiness() {
        let next = estimate(Grade::Again, &state(1.4, 2, 30.0)).unwrap();
        assert_eq!(next.easiness_factor, MIN_EASINESS);
    }

    #[test]
    fn test_first_success_steps() {
        let s = state(2.5, 0, 0.0);
        assert_eq!(estimate(Grade::Hard, &s).unwrap().interval_hours, 12.0);
        assert_eq!(estimate(Grade::Good, &s).unwrap().interval_hours, 24.0);
        assert_eq!(estimate(Grade::Easy, &s).unwrap().interval_hours, 48.0);
        assert_eq!(estimate(Grade::Good, &s).unwrap().label(), "1.0d");
        assert_eq!(estimate(Grade::Hard, &s).unwrap().label(), "12.0h");
    }

    #[test]
    fn test_second_success_steps() {
        let s = state(2.5, 1, 24.0);
        assert_eq!(estimate(Grade::Hard, &s).unwrap().interval_hours, 72.0);
        assert_eq!(estimate(Grade::Good, &s).unwrap().interval_hours, 144.0);

        let easy = estimate(Grade::Easy, &s).unwrap();
        assert_eq!(easy.interval_hours, 288.0);
        assert_eq!(easy.repetitions, 2);
        assert_eq!(easy.label(), "12.0d");
    }

    #[test]
    fn test_growth_uses_easiness() {
        let good = estimate(Grade::Good, &state(2.0, 4, 100.0)).unwrap();
        assert!(approx(good.interval_hours, 200.0));
        assert_eq!(good.label(), "8.3d");

        let easy = estimate(Grade::Easy, &state(2.0, 5, 100.0)).unwrap();
        assert!(approx(easy.interval_hours, 260.0));
        assert_eq!(easy.repetitions, 6);
        assert_eq!(easy.label(), "10.8d");
        assert_eq!(estimate_next_interval(4, 2.0, 5, 100.0).unwrap(), "10.8d");

        let hard = estimate(Grade::Hard, &state(2.0, 5, 100.0)).unwrap();
        assert!(approx(hard.interval_hours, 160.0));
    }

    #[test]
    fn test_interval_clamped_to_sixty_days() {
        let next = estimate(Grade::Easy, &state(2.5, 8, 1000.0)).unwrap();
        assert_eq!(next.interval_hours, MAX_INTERVAL_HOURS);
        assert_eq!(next.label(), "2.0mo");
    }

    #[test]
    fn test_easiness_updates() {
        let s = state(2.5, 3, 10.0);
        assert!(approx(estimate(Grade::Easy, &s).unwrap().easiness_factor, 2.5));
        assert!(approx(estimate(Grade::Good, &s).unwrap().easiness_factor, 2.36));
        // Hard is penalised too, not held neutral as in classic SM-2
        assert!(approx(estimate(Grade::Hard, &s).unwrap().easiness_factor, 2.18));
        assert_eq!(
            estimate(Grade::Hard, &state(1.35, 3, 10.0)).unwrap().easiness_factor,
            MIN_EASINESS
        );
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(matches!(estimate_next_interval(0, 2.5, 0, 0.0), Err(Error::InvalidArgument(_))));
        assert!(matches!(estimate_next_interval(5, 2.5, 0, 0.0), Err(Error::InvalidArgument(_))));
        assert!(matches!(estimate_next_interval(3, 1.2, 0, 0.0), Err(Error::InvalidArgument(_))));
        assert!(matches!(estimate_next_interval(3, f64::NAN, 0, 0.0), Err(Error::InvalidArgument(_))));
        assert!(matches!(estimate_next_interval(3, 2.5, 3, -1.0), Err(Error::InvalidArgument(_))));
        assert!(matches!(
            estimate_next_interval(3, 2.5, 3, f64::INFINITY),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_format_boundaries() {
        assert_eq!(format_interval(0.0), "0m");
        assert_eq!(format_interval(0.5), "30m");
        assert_eq!(format_interval(0.99), "59m");
        assert_eq!(format_interval(1.0), "1.0h");
        assert_eq!(format_interval(23.99), "24.0h");
        assert_eq!(format_interval(24.0), "1.0d");
        assert_eq!(format_interval(29.9 * 24.0), "29.9d");
        assert_eq!(format_interval(30.0 * 24.0), "1.0mo");
        assert_eq!(format_interval(1440.0), "2.0mo");
    }

    #[test]
    fn test_format_rounds_halves_up() {
        assert_eq!(format_interval(1.25), "1.3h");
        assert_eq!(format_interval(2.75 * 24.0), "2.8d");
    }

    #[test]
    fn test_format_rounds_stored_value_below_half_down() {
        // 1.15 is stored just below 1.15
        assert_eq!(format_interval(1.15), "1.1h");

        // 12 * 2.3 = 27.599999999999998h, just under 1.15 days
        let good = estimate(Grade::Good, &state(2.3, 3, 12.0)).unwrap();
        assert!(good.interval_hours < 27.6);
        assert_eq!(good.label(), "1.1d");
        assert_eq!(estimate_next_interval(3, 2.3, 3, 12.0).unwrap(), "1.1d");
    }

    #[test]
    fn test_preview_in_button_order() {
        let preview = preview_intervals(&state(2.5, 1, 24.0)).unwrap();
        let labels: Vec<_> = preview.iter().map(|(g, l)| (*g, l.as_str())).collect();
        assert_eq!(
            labels,
            vec![
                (Grade::Again, "1.0d"),
                (Grade::Hard, "3.0d"),
                (Grade::Good, "6.0d"),
                (Grade::Easy, "12.0d"),
            ]
        );
        assert!(preview_intervals(&state(0.5, 1, 24.0)).is_err());
    }

    proptest! {
        #[test]
        fn prop_estimate_respects_bounds(
            grade in 1u8..=4,
            ef in 1.3f64..5.0,
            repetitions in 0u32..50,
            interval_hours in 0.0f64..10_000.0,
        ) {
            let grade = Grade::try_from(grade).unwrap();
            let before = state(ef, repetitions, interval_hours);
            let next = estimate(grade, &before).unwrap();

            prop_assert!(next.interval_hours <= MAX_INTERVAL_HOURS);
            prop_assert!(next.easiness_factor >= MIN_EASINESS);
            if grade.is_lapse() {
                prop_assert_eq!(next.repetitions, 0);
                prop_assert_eq!(next.easiness_factor, (ef - 0.2).max(MIN_EASINESS));
            } else {
                prop_assert_eq!(next.repetitions, repetitions + 1);
            }
            prop_assert_eq!(next.label(), estimate(grade, &before).unwrap().label());
        }
    }
}

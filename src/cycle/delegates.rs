use chrono::NaiveDate;

use super::schemas::*;
use crate::profiles::schemas::SkinType;
use crate::routines::schemas::{AdjustmentTrigger, RoutineAdjustment};

/// Pure phase computation. Precondition: `cycle_length >= 1`; callers
/// validate before invoking, the function itself does not guard.
pub fn compute_cycle_phase(
    cycle_start_date: NaiveDate,
    cycle_length: i64,
    today: NaiveDate,
) -> CyclePhaseInfo {
    let days_since_start = (today - cycle_start_date).num_days();
    let day_index = days_since_start.rem_euclid(cycle_length);
    let day_in_cycle = day_index + 1;

    let day_fraction = day_index as f64 / cycle_length as f64;

    let (phase, next_boundary_fraction) = if day_fraction < MENSTRUAL_END_FRACTION {
        (CyclePhase::Menstrual, MENSTRUAL_END_FRACTION)
    } else if day_fraction < FOLLICULAR_END_FRACTION {
        (CyclePhase::Follicular, FOLLICULAR_END_FRACTION)
    } else if day_fraction < OVULATORY_END_FRACTION {
        (CyclePhase::Ovulatory, OVULATORY_END_FRACTION)
    } else {
        // Luteal runs to the end of the cycle, then wraps to day 1.
        (CyclePhase::Luteal, 1.0)
    };

    let next_boundary_day = (next_boundary_fraction * cycle_length as f64).ceil() as i64;
    let days_until_next_phase = (next_boundary_day - day_index).max(1);

    CyclePhaseInfo {
        phase,
        day_in_cycle,
        days_until_next_phase,
        cycle_length,
    }
}

pub fn phase_rule_for(phase: CyclePhase) -> PhaseRule {
    let mut rules = get_phase_rules();
    let index = rules
        .iter()
        .position(|rule| rule.phase == phase)
        .unwrap_or(0);
    rules.swap_remove(index)
}

/// Stateless: the phase plus the static table fully determine the output.
pub fn get_cycle_adjustments(
    phase: CyclePhase,
    skin_type: Option<SkinType>,
) -> Vec<RoutineAdjustment> {
    let rule = phase_rule_for(phase);
    let trigger = AdjustmentTrigger::Cycle(phase);

    let mut adjustments: Vec<RoutineAdjustment> = rule
        .base_adjustments
        .iter()
        .map(|template| template.materialize(trigger))
        .collect();

    if let Some(skin_type) = skin_type {
        for (extra_skin_type, templates) in &rule.skin_type_extras {
            if *extra_skin_type == skin_type {
                adjustments.extend(templates.iter().map(|template| template.materialize(trigger)));
            }
        }
    }

    adjustments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routines::schemas::AdjustmentType;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn day_eleven_of_standard_cycle_is_follicular() {
        // Start 10 days ago: day_in_cycle 11, fraction 10/28 ~ 0.357.
        let info = compute_cycle_phase(date(2026, 8, 18), 28, date(2026, 8, 28));
        assert_eq!(info.day_in_cycle, 11);
        assert_eq!(info.phase, CyclePhase::Follicular);
        // Ovulatory starts at day index 13, i.e. 3 days away.
        assert_eq!(info.days_until_next_phase, 3);
    }

    #[test]
    fn first_day_is_menstrual() {
        let info = compute_cycle_phase(date(2026, 8, 28), 28, date(2026, 8, 28));
        assert_eq!(info.day_in_cycle, 1);
        assert_eq!(info.phase, CyclePhase::Menstrual);
    }

    #[test]
    fn phase_boundaries_on_standard_cycle() {
        let start = date(2026, 8, 1);
        // Day index 4 is the last menstrual day, 5 the first follicular.
        assert_eq!(
            compute_cycle_phase(start, 28, date(2026, 8, 5)).phase,
            CyclePhase::Menstrual
        );
        assert_eq!(
            compute_cycle_phase(start, 28, date(2026, 8, 6)).phase,
            CyclePhase::Follicular
        );
        // Index 13 -> ovulatory, index 16 -> luteal.
        assert_eq!(
            compute_cycle_phase(start, 28, date(2026, 8, 14)).phase,
            CyclePhase::Ovulatory
        );
        assert_eq!(
            compute_cycle_phase(start, 28, date(2026, 8, 17)).phase,
            CyclePhase::Luteal
        );
    }

    #[test]
    fn cycle_wraps_after_luteal() {
        let start = date(2026, 8, 1);
        let last_day = compute_cycle_phase(start, 28, date(2026, 8, 28));
        assert_eq!(last_day.day_in_cycle, 28);
        assert_eq!(last_day.phase, CyclePhase::Luteal);
        assert_eq!(last_day.days_until_next_phase, 1);

        let wrapped = compute_cycle_phase(start, 28, date(2026, 8, 29));
        assert_eq!(wrapped.day_in_cycle, 1);
        assert_eq!(wrapped.phase, CyclePhase::Menstrual);
    }

    #[test]
    fn non_standard_cycle_partitions_proportionally() {
        let start = date(2026, 8, 1);
        // 21-day cycle: menstrual ends at index 5/28*21 = 3.75.
        assert_eq!(
            compute_cycle_phase(start, 21, date(2026, 8, 4)).phase,
            CyclePhase::Menstrual
        );
        assert_eq!(
            compute_cycle_phase(start, 21, date(2026, 8, 5)).phase,
            CyclePhase::Follicular
        );
        // Every day of a 35-day cycle falls in exactly one phase.
        for offset in 0..35u64 {
            let info = compute_cycle_phase(start, 35, start + chrono::Days::new(offset));
            assert!(info.day_in_cycle >= 1 && info.day_in_cycle <= 35);
            assert!(info.days_until_next_phase >= 1);
        }
    }

    #[test]
    fn luteal_clay_mask_fires_for_oily_but_not_dry() {
        let oily = get_cycle_adjustments(CyclePhase::Luteal, Some(SkinType::Oily));
        assert!(oily.iter().any(|adjustment| {
            adjustment.adjustment_type == AdjustmentType::Add
                && adjustment.product_category == "mask"
        }));

        let dry = get_cycle_adjustments(CyclePhase::Luteal, Some(SkinType::Dry));
        assert!(!dry.iter().any(|adjustment| {
            adjustment.adjustment_type == AdjustmentType::Add
                && adjustment.product_category == "mask"
        }));
    }

    #[test]
    fn base_adjustments_fire_without_a_skin_type() {
        let adjustments = get_cycle_adjustments(CyclePhase::Menstrual, None);
        assert!(!adjustments.is_empty());
        assert!(adjustments.iter().all(|adjustment| {
            adjustment.trigger == AdjustmentTrigger::Cycle(CyclePhase::Menstrual)
        }));
    }

    #[test]
    fn every_phase_has_guidance() {
        for rule in get_phase_rules() {
            assert!(!rule.skin_behavior.is_empty());
            assert!(rule.general_recommendations.len() >= 4);
            assert!(!rule.base_adjustments.is_empty());
        }
    }
}

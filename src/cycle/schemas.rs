use serde::{Deserialize, Serialize};

use crate::profiles::schemas::SkinType;
use crate::routines::schemas::{AdjustmentTemplate, AdjustmentType};

/// Phase boundaries as fractions of a standard 28-day cycle, scaled to the
/// user's actual cycle length so non-standard cycles still partition into
/// four proportional phases.
pub const MENSTRUAL_END_FRACTION: f64 = 5.0 / 28.0;
pub const FOLLICULAR_END_FRACTION: f64 = 13.0 / 28.0;
pub const OVULATORY_END_FRACTION: f64 = 16.0 / 28.0;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    Menstrual,
    Follicular,
    Ovulatory,
    Luteal,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct CyclePhaseInfo {
    pub phase: CyclePhase,
    pub day_in_cycle: i64,
    pub days_until_next_phase: i64,
    pub cycle_length: i64,
}

pub struct PhaseRule {
    pub phase: CyclePhase,
    pub skin_behavior: &'static str,
    pub general_recommendations: Vec<&'static str>,
    pub base_adjustments: Vec<AdjustmentTemplate>,
    pub skin_type_extras: Vec<(SkinType, Vec<AdjustmentTemplate>)>,
}

pub fn get_phase_rules() -> Vec<PhaseRule> {
    vec![
        PhaseRule {
            phase: CyclePhase::Menstrual,
            skin_behavior: "Hormone levels bottom out; skin tends to be drier, duller and more reactive than usual.",
            general_recommendations: vec![
                "Stick to a gentle, low-foam cleanser",
                "Layer hydration instead of adding new actives",
                "Keep showers lukewarm to protect the barrier",
                "A weekly hydrating mask helps with dullness",
                "Prioritize sleep and water intake",
            ],
            base_adjustments: vec![
                AdjustmentTemplate {
                    adjustment_type: AdjustmentType::Emphasize,
                    product_category: "moisturizer",
                    reason: "Estrogen is at its lowest point, so the skin barrier holds less water",
                    suggestion: "Use a richer moisturizer morning and evening this week",
                },
                AdjustmentTemplate {
                    adjustment_type: AdjustmentType::Reduce,
                    product_category: "exfoliant",
                    reason: "A weakened barrier tolerates acids poorly",
                    suggestion: "Cut exfoliation down to at most once this week",
                },
            ],
            skin_type_extras: vec![
                (
                    SkinType::Sensitive,
                    vec![AdjustmentTemplate {
                        adjustment_type: AdjustmentType::Avoid,
                        product_category: "exfoliant",
                        reason: "Sensitive skin is at its most reactive during menstruation",
                        suggestion: "Pause acids and retinoids until the follicular phase",
                    }],
                ),
                (
                    SkinType::Dry,
                    vec![AdjustmentTemplate {
                        adjustment_type: AdjustmentType::Add,
                        product_category: "face_oil",
                        reason: "Dry skin loses the most water when estrogen dips",
                        suggestion: "Seal your night routine with a few drops of face oil",
                    }],
                ),
            ],
        },
        PhaseRule {
            phase: CyclePhase::Follicular,
            skin_behavior: "Rising estrogen strengthens the barrier; skin is balanced and tolerates actives well.",
            general_recommendations: vec![
                "This is the best week to introduce a new active",
                "Vitamin C pairs well with the natural glow phase",
                "Book treatments or peels for this window",
                "Keep sunscreen consistent as you step up actives",
            ],
            base_adjustments: vec![
                AdjustmentTemplate {
                    adjustment_type: AdjustmentType::Add,
                    product_category: "exfoliant",
                    reason: "Skin tolerates actives best while estrogen climbs",
                    suggestion: "Introduce or step up chemical exfoliation now",
                },
                AdjustmentTemplate {
                    adjustment_type: AdjustmentType::Emphasize,
                    product_category: "serum",
                    reason: "A resilient barrier makes the most of treatment serums",
                    suggestion: "Use your antioxidant serum every morning",
                },
            ],
            skin_type_extras: vec![(
                SkinType::Dry,
                vec![AdjustmentTemplate {
                    adjustment_type: AdjustmentType::Add,
                    product_category: "essence",
                    reason: "Extra water layers extend the hydrated feel of this phase",
                    suggestion: "Pat in a hydrating essence before your serum",
                }],
            )],
        },
        PhaseRule {
            phase: CyclePhase::Ovulatory,
            skin_behavior: "Estrogen peaks; skin is typically at its clearest and most resilient.",
            general_recommendations: vec![
                "Maintain rather than experiment this week",
                "Reapply sunscreen if you spend the day outside",
                "Lighter textures are usually enough right now",
                "Keep makeup brushes and pillowcases clean before the luteal shift",
            ],
            base_adjustments: vec![AdjustmentTemplate {
                adjustment_type: AdjustmentType::Emphasize,
                product_category: "sunscreen",
                reason: "Clear, resilient skin still burns; outdoor time peaks mid-cycle",
                suggestion: "Keep SPF on top of the routine and reapply at midday",
            }],
            skin_type_extras: vec![
                (
                    SkinType::Oily,
                    vec![AdjustmentTemplate {
                        adjustment_type: AdjustmentType::Reduce,
                        product_category: "face_oil",
                        reason: "Sebum output starts climbing toward the luteal phase",
                        suggestion: "Skip occlusive oils for the next few days",
                    }],
                ),
                (
                    SkinType::Combination,
                    vec![AdjustmentTemplate {
                        adjustment_type: AdjustmentType::Emphasize,
                        product_category: "toner",
                        reason: "The T-zone gets oilier first as hormones shift",
                        suggestion: "Use a balancing toner on the T-zone after cleansing",
                    }],
                ),
            ],
        },
        PhaseRule {
            phase: CyclePhase::Luteal,
            skin_behavior: "Progesterone drives oil production up; congestion and premenstrual breakouts are common.",
            general_recommendations: vec![
                "Double-cleanse in the evening if you wear sunscreen or makeup",
                "Resist picking at premenstrual breakouts",
                "Keep spot treatment on hand rather than adding new actives",
                "Salt and sugar spikes show up on the skin this week",
                "Change pillowcases more often than usual",
            ],
            base_adjustments: vec![
                AdjustmentTemplate {
                    adjustment_type: AdjustmentType::Add,
                    product_category: "spot_treatment",
                    reason: "Premenstrual breakouts cluster in this phase",
                    suggestion: "Keep a targeted spot treatment in the evening routine",
                },
                AdjustmentTemplate {
                    adjustment_type: AdjustmentType::Emphasize,
                    product_category: "cleanser",
                    reason: "Higher sebum output congests pores faster",
                    suggestion: "Be consistent with thorough evening cleansing",
                },
            ],
            skin_type_extras: vec![
                (
                    SkinType::Oily,
                    vec![AdjustmentTemplate {
                        adjustment_type: AdjustmentType::Add,
                        product_category: "mask",
                        reason: "Oil output climbs sharply before your period",
                        suggestion: "Work a clay mask in twice this week",
                    }],
                ),
                (
                    SkinType::Combination,
                    vec![AdjustmentTemplate {
                        adjustment_type: AdjustmentType::Add,
                        product_category: "mask",
                        reason: "The T-zone congests first in the luteal phase",
                        suggestion: "Use a clay mask on the T-zone once this week",
                    }],
                ),
                (
                    SkinType::Dry,
                    vec![AdjustmentTemplate {
                        adjustment_type: AdjustmentType::Reduce,
                        product_category: "exfoliant",
                        reason: "Even dry skin breaks out now, but stripping it makes it worse",
                        suggestion: "Treat spots locally instead of exfoliating all over",
                    }],
                ),
                (
                    SkinType::Sensitive,
                    vec![AdjustmentTemplate {
                        adjustment_type: AdjustmentType::Emphasize,
                        product_category: "moisturizer",
                        reason: "Hormonal swings make sensitive skin flare",
                        suggestion: "Keep the routine minimal and well-moisturized",
                    }],
                ),
            ],
        },
    ]
}

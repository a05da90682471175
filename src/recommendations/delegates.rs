use futures::TryStreamExt;
use mongodb::{Collection, bson::doc};
use mongodb::bson::DateTime as BsonDateTime;
use std::collections::{HashMap, HashSet};
use tracing::info;

use super::schemas::*;
use crate::{
    DB,
    apex::utils::VerboseHTTPError,
    catalog,
    catalog::schemas::Product,
    effectiveness::schemas::{
        COLLECTION_INGREDIENT_EFFECTIVENESS, COLLECTION_PRODUCT_EFFECTIVENESS,
        IngredientEffectivenessRecord, ProductEffectivenessRecord, WILDCARD_SEGMENT,
    },
    profiles,
    routines,
};

/// A candidate surviving the effectiveness query, joined with its catalog
/// metadata, in query order (score descending).
#[derive(Debug, Clone)]
pub struct Candidate {
    pub product_id: String,
    pub name: String,
    pub brand: String,
    pub effectiveness_score: f64,
    pub sample_size: i64,
}

pub fn compute_ingredient_boost(
    ingredient_ids: &[String],
    boost_scores: &HashMap<String, f64>,
) -> f64 {
    let raw: f64 = ingredient_ids
        .iter()
        .filter_map(|ingredient_id| boost_scores.get(ingredient_id))
        .map(|score| score * INGREDIENT_BOOST_WEIGHT)
        .sum();
    raw.min(MAX_INGREDIENT_BOOST)
}

pub fn compute_match_score(effectiveness_score: f64, boost: f64) -> i64 {
    let base = effectiveness_score * 100.0;
    let boost = boost.min(MAX_INGREDIENT_BOOST);
    ((base + boost).round() as i64).clamp(0, MAX_MATCH_SCORE)
}

fn build_reasons(candidate: &Candidate, boost: f64, skin_label: &str) -> Vec<String> {
    let mut reasons = Vec::new();

    if candidate.sample_size >= TRUST_SAMPLE_SIZE {
        reasons.push(format!(
            "Backed by {} reports from {} skin users",
            candidate.sample_size, skin_label
        ));
    }
    if candidate.effectiveness_score >= HIGHLIGHT_EFFECTIVENESS {
        reasons.push(format!(
            "{:.0}% effectiveness for {} skin",
            candidate.effectiveness_score * 100.0,
            skin_label
        ));
    }
    if boost > 0.0 {
        reasons.push("Contains ingredients that score highly for your concerns".to_string());
    }
    if reasons.is_empty() {
        reasons.push("Learned from community feedback for your skin type".to_string());
    }

    reasons
}

/// Core ranking step, pure over its inputs. Ties in match_score keep the
/// candidate order (descending effectiveness score); the sort is stable and
/// no secondary key is applied.
pub fn rank_candidates(
    candidates: &[Candidate],
    owned: &HashSet<String>,
    links: &HashMap<String, Vec<String>>,
    boost_scores: &HashMap<String, f64>,
    skin_label: &str,
) -> Vec<PersonalizedRecommendation> {
    let mut recommendations: Vec<PersonalizedRecommendation> = candidates
        .iter()
        .filter(|candidate| !owned.contains(&candidate.product_id))
        .map(|candidate| {
            let boost = match links.get(&candidate.product_id) {
                Some(ingredient_ids) => compute_ingredient_boost(ingredient_ids, boost_scores),
                None => 0.0,
            };

            PersonalizedRecommendation {
                product_id: candidate.product_id.clone(),
                name: candidate.name.clone(),
                brand: candidate.brand.clone(),
                match_score: compute_match_score(candidate.effectiveness_score, boost),
                reasons: build_reasons(candidate, boost, skin_label),
                effectiveness_data: Some(EffectivenessData {
                    effectiveness_score: candidate.effectiveness_score,
                    sample_size: candidate.sample_size,
                }),
            }
        })
        .collect();

    recommendations.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    recommendations.truncate(MAX_RECOMMENDATIONS);
    recommendations
}

/// Raw-rating path used when nothing clears the learned-effectiveness bar.
/// Distinguishable from the primary path: no effectiveness data, reasons
/// cite the review rating.
pub fn fallback_recommendation(product: &Product) -> PersonalizedRecommendation {
    PersonalizedRecommendation {
        product_id: product.product_id.clone(),
        name: product.name.clone(),
        brand: product.brand.clone(),
        match_score: ((product.rating_avg * 20.0).round() as i64).clamp(0, MAX_MATCH_SCORE),
        reasons: vec![format!(
            "Rated {:.1} out of 5 by {} reviewers",
            product.rating_avg, product.review_count
        )],
        effectiveness_data: None,
    }
}

fn skin_segment_keys(skin_type: Option<crate::profiles::schemas::SkinType>) -> Vec<&'static str> {
    match skin_type {
        Some(skin_type) => vec![skin_type.label(), WILDCARD_SEGMENT],
        None => vec![WILDCARD_SEGMENT],
    }
}

async fn load_boost_scores(
    concerns: &[String],
    skin_keys: &[&str],
) -> Result<HashMap<String, f64>, VerboseHTTPError> {
    let Some(database) = DB.get() else {
        return Err(VerboseHTTPError::internal("Database unavailable"));
    };

    let collection: Collection<IngredientEffectivenessRecord> =
        database.collection(COLLECTION_INGREDIENT_EFFECTIVENESS);

    let mut boost_scores: HashMap<String, f64> = HashMap::new();

    for concern in concerns {
        let cursor = collection
            .find(doc! {
                "concern_segment": { "$in": [concern.as_str(), WILDCARD_SEGMENT] },
                "skin_segment": { "$in": skin_keys.to_vec() },
                "sample_size": { "$gte": MIN_SAMPLE_SIZE },
                "effectiveness_score": { "$gte": MIN_BOOST_INGREDIENT_SCORE },
            })
            .await
            .map_err(|_| VerboseHTTPError::internal("Database error"))?;

        let records: Vec<IngredientEffectivenessRecord> = cursor
            .try_collect()
            .await
            .map_err(|_| VerboseHTTPError::internal("Database error"))?;

        for record in records {
            boost_scores
                .entry(record.ingredient_id)
                .and_modify(|score| *score = score.max(record.effectiveness_score))
                .or_insert(record.effectiveness_score);
        }
    }

    Ok(boost_scores)
}

pub async fn get_personalized_recommendations(
    user_id: &str,
) -> Result<RecommendationResponse, VerboseHTTPError> {
    let Some(database) = DB.get() else {
        return Err(VerboseHTTPError::internal("Database unavailable"));
    };

    let Some(profile) = profiles::delegates::get_profile(user_id).await? else {
        // Not onboarded: nothing to rank against yet.
        return Ok(RecommendationResponse {
            user_id: user_id.to_string(),
            recommendations: Vec::new(),
            generated_at: BsonDateTime::now(),
        });
    };

    let skin_keys = skin_segment_keys(profile.skin_type);
    let skin_label = profile
        .skin_type
        .map(|skin_type| skin_type.label())
        .unwrap_or("all");

    let effectiveness: Collection<ProductEffectivenessRecord> =
        database.collection(COLLECTION_PRODUCT_EFFECTIVENESS);

    let cursor = effectiveness
        .find(doc! {
            "skin_segment": { "$in": skin_keys.clone() },
            "sample_size": { "$gte": MIN_SAMPLE_SIZE },
            "effectiveness_score": { "$gte": MIN_PRODUCT_EFFECTIVENESS },
        })
        .sort(doc! { "effectiveness_score": -1 })
        .limit(CANDIDATE_LIMIT)
        .await
        .map_err(|_| VerboseHTTPError::internal("Database error"))?;

    let records: Vec<ProductEffectivenessRecord> = cursor
        .try_collect()
        .await
        .map_err(|_| VerboseHTTPError::internal("Database error"))?;

    let owned = routines::delegates::get_owned_product_ids(user_id).await?;

    if records.is_empty() {
        let products =
            catalog::delegates::get_top_rated_products(MIN_FALLBACK_RATING, MAX_FALLBACK_RESULTS)
                .await?;

        let recommendations: Vec<PersonalizedRecommendation> = products
            .iter()
            .filter(|product| !owned.contains(&product.product_id))
            .map(fallback_recommendation)
            .collect();

        info!(user_id, count = recommendations.len(), "serving rating fallback recommendations");

        return Ok(RecommendationResponse {
            user_id: user_id.to_string(),
            recommendations,
            generated_at: BsonDateTime::now(),
        });
    }

    // A product can qualify under both its specific segment and the wildcard
    // bucket; keep the first (highest-scored) occurrence.
    let mut seen: HashSet<String> = HashSet::new();
    let mut deduped: Vec<ProductEffectivenessRecord> = Vec::new();
    for record in records {
        if seen.insert(record.product_id.clone()) {
            deduped.push(record);
        }
    }

    let candidate_ids: Vec<String> = deduped
        .iter()
        .map(|record| record.product_id.clone())
        .collect();

    let products: Collection<Product> =
        database.collection(catalog::schemas::COLLECTION_PRODUCTS);
    let cursor = products
        .find(doc! { "product_id": { "$in": candidate_ids.clone() }, "enabled": true })
        .await
        .map_err(|_| VerboseHTTPError::internal("Database error"))?;
    let metadata: HashMap<String, Product> = cursor
        .try_collect::<Vec<Product>>()
        .await
        .map_err(|_| VerboseHTTPError::internal("Database error"))?
        .into_iter()
        .map(|product| (product.product_id.clone(), product))
        .collect();

    let candidates: Vec<Candidate> = deduped
        .iter()
        .filter_map(|record| {
            metadata.get(&record.product_id).map(|product| Candidate {
                product_id: record.product_id.clone(),
                name: product.name.clone(),
                brand: product.brand.clone(),
                effectiveness_score: record.effectiveness_score,
                sample_size: record.sample_size,
            })
        })
        .collect();

    let boost_scores = load_boost_scores(&profile.concerns, &skin_keys).await?;
    let links = catalog::delegates::get_attributed_ingredients_for(&candidate_ids).await?;

    let recommendations = rank_candidates(&candidates, &owned, &links, &boost_scores, skin_label);

    info!(user_id, count = recommendations.len(), "serving learned recommendations");

    Ok(RecommendationResponse {
        user_id: user_id.to_string(),
        recommendations,
        generated_at: BsonDateTime::now(),
    })
}

fn onboarding_insight() -> LearningInsight {
    LearningInsight {
        insight_type: InsightType::Onboarding,
        title: "Tell us about your skin".to_string(),
        description: "Set your skin type and concerns to unlock personalized effectiveness insights"
            .to_string(),
    }
}

pub async fn get_learning_insights(user_id: &str) -> Result<InsightsResponse, VerboseHTTPError> {
    let Some(database) = DB.get() else {
        return Err(VerboseHTTPError::internal("Database unavailable"));
    };

    let Some(profile) = profiles::delegates::get_profile(user_id).await? else {
        return Ok(InsightsResponse {
            user_id: user_id.to_string(),
            insights: vec![onboarding_insight()],
            generated_at: BsonDateTime::now(),
        });
    };

    let mut insights: Vec<LearningInsight> = Vec::new();

    if let Some(skin_type) = profile.skin_type {
        let ingredients: Collection<IngredientEffectivenessRecord> =
            database.collection(COLLECTION_INGREDIENT_EFFECTIVENESS);

        let cursor = ingredients
            .find(doc! {
                "skin_segment": skin_type.label(),
                "sample_size": { "$gte": MIN_SAMPLE_SIZE },
            })
            .sort(doc! { "effectiveness_score": -1 })
            .limit(CANDIDATE_LIMIT)
            .await
            .map_err(|_| VerboseHTTPError::internal("Database error"))?;

        let records: Vec<IngredientEffectivenessRecord> = cursor
            .try_collect()
            .await
            .map_err(|_| VerboseHTTPError::internal("Database error"))?;

        // The same ingredient appears once per concern segment; keep its
        // best-scoring record.
        let mut seen: HashSet<String> = HashSet::new();
        for record in records {
            if insights.len() >= MAX_INGREDIENT_INSIGHTS {
                break;
            }
            if !seen.insert(record.ingredient_id.clone()) {
                continue;
            }
            insights.push(LearningInsight {
                insight_type: InsightType::IngredientEffectiveness,
                title: format!("{} works for {} skin", record.ingredient_id, skin_type.label()),
                description: format!(
                    "{:.0}% effectiveness across {} reports from {} skin users",
                    record.effectiveness_score * 100.0,
                    record.sample_size,
                    skin_type.label()
                ),
            });
        }
    }

    let trends: Collection<TrendSignal> = database.collection(COLLECTION_TREND_SIGNALS);
    let cursor = trends
        .find(doc! {})
        .sort(doc! { "last_seen": -1 })
        .limit(MAX_TREND_INSIGHTS)
        .await
        .map_err(|_| VerboseHTTPError::internal("Database error"))?;
    let trend_signals: Vec<TrendSignal> = cursor
        .try_collect()
        .await
        .map_err(|_| VerboseHTTPError::internal("Database error"))?;

    for signal in trend_signals {
        insights.push(LearningInsight {
            insight_type: InsightType::Trending,
            title: format!("{} is trending", signal.term),
            description: format!(
                "Mentioned {} times recently across community reviews",
                signal.mention_count
            ),
        });
    }

    if let Some(skin_type) = profile.skin_type {
        let patterns: Collection<LearningPattern> =
            database.collection(COLLECTION_LEARNING_PATTERNS);
        let cursor = patterns
            .find(doc! {
                "skin_type": skin_type.label(),
                "confidence_score": { "$gte": MIN_PATTERN_CONFIDENCE },
                "sample_size": { "$gte": MIN_SAMPLE_SIZE },
            })
            .sort(doc! { "confidence_score": -1 })
            .limit(MAX_PATTERN_INSIGHTS)
            .await
            .map_err(|_| VerboseHTTPError::internal("Database error"))?;
        let learning_patterns: Vec<LearningPattern> = cursor
            .try_collect()
            .await
            .map_err(|_| VerboseHTTPError::internal("Database error"))?;

        for pattern in learning_patterns {
            insights.push(LearningInsight {
                insight_type: InsightType::LearningPattern,
                title: format!("Pattern in {} skin feedback", pattern.skin_type.label()),
                description: format!(
                    "{} ({:.0}% confidence, {} reports)",
                    pattern.pattern,
                    pattern.confidence_score * 100.0,
                    pattern.sample_size
                ),
            });
        }
    }

    insights.truncate(MAX_INSIGHTS);

    Ok(InsightsResponse {
        user_id: user_id.to_string(),
        insights,
        generated_at: BsonDateTime::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::schemas::ProductCategory;

    fn candidate(product_id: &str, score: f64, sample_size: i64) -> Candidate {
        Candidate {
            product_id: product_id.to_string(),
            name: format!("Product {product_id}"),
            brand: "Lab".to_string(),
            effectiveness_score: score,
            sample_size,
        }
    }

    #[test]
    fn boost_is_capped_at_twenty_points() {
        let boost_scores: HashMap<String, f64> = [
            ("niacinamide".to_string(), 0.9),
            ("zinc".to_string(), 0.8),
            ("retinol".to_string(), 0.95),
            ("azelaic-acid".to_string(), 0.85),
        ]
        .into_iter()
        .collect();

        let ingredient_ids: Vec<String> = boost_scores.keys().cloned().collect();
        // Raw boost is 35 points; the cap brings it back to 20.
        assert_eq!(compute_ingredient_boost(&ingredient_ids, &boost_scores), 20.0);
    }

    #[test]
    fn match_score_never_exceeds_ninety_nine() {
        assert_eq!(compute_match_score(0.95, 30.0), 99);
        assert_eq!(compute_match_score(1.0, 20.0), 99);
        assert_eq!(compute_match_score(0.6, 0.0), 60);
        for score in [0.0, 0.25, 0.5, 0.75, 0.9, 1.0] {
            for boost in [0.0, 5.0, 20.0, 50.0] {
                let match_score = compute_match_score(score, boost);
                assert!((0..=99).contains(&match_score));
            }
        }
    }

    #[test]
    fn owned_products_are_excluded() {
        let candidates = vec![candidate("p1", 0.9, 12), candidate("p2", 0.8, 5)];
        let owned: HashSet<String> = ["p1".to_string()].into_iter().collect();

        let ranked = rank_candidates(&candidates, &owned, &HashMap::new(), &HashMap::new(), "oily");
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].product_id, "p2");
    }

    #[test]
    fn ties_preserve_candidate_order() {
        let candidates = vec![
            candidate("first", 0.8, 5),
            candidate("second", 0.8, 5),
            candidate("third", 0.8, 5),
        ];
        let ranked = rank_candidates(
            &candidates,
            &HashSet::new(),
            &HashMap::new(),
            &HashMap::new(),
            "dry",
        );
        let order: Vec<&str> = ranked
            .iter()
            .map(|recommendation| recommendation.product_id.as_str())
            .collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn result_is_capped_at_ten() {
        let candidates: Vec<Candidate> = (0..15)
            .map(|n| candidate(&format!("p{n}"), 0.9 - n as f64 * 0.01, 5))
            .collect();
        let ranked = rank_candidates(
            &candidates,
            &HashSet::new(),
            &HashMap::new(),
            &HashMap::new(),
            "oily",
        );
        assert_eq!(ranked.len(), MAX_RECOMMENDATIONS);
    }

    #[test]
    fn boost_changes_ranking() {
        let candidates = vec![candidate("plain", 0.85, 5), candidate("boosted", 0.8, 5)];
        let links: HashMap<String, Vec<String>> = [(
            "boosted".to_string(),
            vec!["niacinamide".to_string()],
        )]
        .into_iter()
        .collect();
        let boost_scores: HashMap<String, f64> =
            [("niacinamide".to_string(), 0.9)].into_iter().collect();

        let ranked = rank_candidates(&candidates, &HashSet::new(), &links, &boost_scores, "oily");
        // 80 + 9 beats 85.
        assert_eq!(ranked[0].product_id, "boosted");
        assert_eq!(ranked[0].match_score, 89);
    }

    #[test]
    fn reasons_reflect_trust_and_effectiveness_gates() {
        let trusted = candidate("p1", 0.85, 12);
        let ranked = rank_candidates(
            &[trusted],
            &HashSet::new(),
            &HashMap::new(),
            &HashMap::new(),
            "oily",
        );
        let reasons = &ranked[0].reasons;
        assert!(reasons.iter().any(|reason| reason.contains("12 reports")));
        assert!(reasons.iter().any(|reason| reason.contains("85% effectiveness")));

        let thin = candidate("p2", 0.65, 4);
        let ranked = rank_candidates(
            &[thin],
            &HashSet::new(),
            &HashMap::new(),
            &HashMap::new(),
            "oily",
        );
        let reasons = &ranked[0].reasons;
        assert!(!reasons.iter().any(|reason| reason.contains("reports from")));
        assert!(!reasons.iter().any(|reason| reason.contains("% effectiveness")));
    }

    #[test]
    fn fallback_cites_the_raw_rating_only() {
        let product = Product {
            id: None,
            product_id: "p1".to_string(),
            name: "Gentle Cleanser".to_string(),
            brand: "Lab".to_string(),
            category: ProductCategory::Cleanser,
            rating_avg: 4.6,
            review_count: 123,
            enabled: true,
        };

        let recommendation = fallback_recommendation(&product);
        assert!(recommendation.effectiveness_data.is_none());
        assert_eq!(recommendation.match_score, 92);
        assert_eq!(recommendation.reasons.len(), 1);
        assert!(recommendation.reasons[0].contains("4.6 out of 5"));
        assert!(!recommendation.reasons[0].contains("effectiveness"));
    }

    #[test]
    fn fallback_score_is_capped_for_perfect_ratings() {
        let product = Product {
            id: None,
            product_id: "p1".to_string(),
            name: "Cult Serum".to_string(),
            brand: "Lab".to_string(),
            category: ProductCategory::Serum,
            rating_avg: 5.0,
            review_count: 40,
            enabled: true,
        };
        assert_eq!(fallback_recommendation(&product).match_score, 99);
    }
}

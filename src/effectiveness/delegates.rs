use futures::TryStreamExt;
use mongodb::{
    Collection,
    bson::{Document, doc},
    options::ReturnDocument,
};
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

use super::schemas::*;
use crate::{DB, apex::utils::VerboseHTTPError, catalog};

impl Reaction {
    pub fn class(&self) -> ReactionClass {
        match self {
            Reaction::HolyGrail | Reaction::Good => ReactionClass::Positive,
            Reaction::Okay => ReactionClass::Neutral,
            Reaction::Bad | Reaction::BrokeMeOut => ReactionClass::Negative,
        }
    }
}

pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// (positive + 0.5 * neutral) / sample_size, neutral prior at zero samples.
pub fn ingredient_score(positive: i64, neutral: i64, sample_size: i64) -> f64 {
    if sample_size == 0 {
        return 0.5;
    }
    round3((positive as f64 + 0.5 * neutral as f64) / sample_size as f64)
}

/// Mean of normalized ratings, neutral prior at zero samples.
pub fn product_score(rating_sum: f64, sample_size: i64) -> f64 {
    if sample_size == 0 {
        return 0.5;
    }
    round3(rating_sum / sample_size as f64)
}

pub fn normalized_rating(rating: i64) -> f64 {
    (rating - 1) as f64 / 4.0
}

pub type IngredientKey = (String, SkinSegment, ConcernSegment);
pub type ProductKey = (String, SkinSegment);

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngredientCounts {
    pub positive: i64,
    pub negative: i64,
    pub neutral: i64,
}

impl IngredientCounts {
    pub fn sample_size(&self) -> i64 {
        self.positive + self.negative + self.neutral
    }

    pub fn score(&self) -> f64 {
        ingredient_score(self.positive, self.neutral, self.sample_size())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProductTally {
    pub rating_sum: f64,
    pub sample_size: i64,
}

impl ProductTally {
    pub fn score(&self) -> f64 {
        product_score(self.rating_sum, self.sample_size)
    }
}

/// Pure replay of a feedback history. Count-based, so the result is
/// independent of event order and of how many times the same history is
/// folded. The incremental path below must agree with this fold exactly.
pub fn fold_events(
    events: &[FeedbackEvent],
    links: &HashMap<String, Vec<String>>,
) -> (
    HashMap<IngredientKey, IngredientCounts>,
    HashMap<ProductKey, ProductTally>,
) {
    let mut ingredient_counts: HashMap<IngredientKey, IngredientCounts> = HashMap::new();
    let mut product_tallies: HashMap<ProductKey, ProductTally> = HashMap::new();

    for event in events {
        let skin_segment = SkinSegment::from_event(event.user_skin_type);
        let concern_segment = ConcernSegment::from_event(event.concern.as_deref());

        if let Some(ingredient_ids) = links.get(&event.product_id) {
            for ingredient_id in ingredient_ids {
                let counts = ingredient_counts
                    .entry((ingredient_id.clone(), skin_segment, concern_segment.clone()))
                    .or_default();
                match event.reaction.class() {
                    ReactionClass::Positive => counts.positive += 1,
                    ReactionClass::Neutral => counts.neutral += 1,
                    ReactionClass::Negative => counts.negative += 1,
                }
            }
        }

        if let Some(rating) = event.rating {
            let tally = product_tallies
                .entry((event.product_id.clone(), skin_segment))
                .or_default();
            tally.rating_sum += normalized_rating(rating);
            tally.sample_size += 1;
        }
    }

    (ingredient_counts, product_tallies)
}

fn ingredient_key_filter(
    ingredient_id: &str,
    skin_segment: SkinSegment,
    concern_segment: &ConcernSegment,
) -> Document {
    doc! {
        "ingredient_id": ingredient_id,
        "skin_segment": skin_segment.as_key(),
        "concern_segment": concern_segment.as_key(),
    }
}

fn product_key_filter(product_id: &str, skin_segment: SkinSegment) -> Document {
    doc! {
        "product_id": product_id,
        "skin_segment": skin_segment.as_key(),
    }
}

/// Incremental path: one event in, every touched record brought up to date.
/// Counters move through atomic $inc so concurrent events for the same key
/// serialize in the store; the derived score is then written behind a
/// sample_size guard so a stale writer no-ops instead of clobbering.
/// Per-record updates are atomic in isolation; the operation as a whole is
/// deliberately not transactional.
pub async fn apply_feedback(event: FeedbackEvent) -> Result<(), VerboseHTTPError> {
    let Some(database) = DB.get() else {
        return Err(VerboseHTTPError::internal("Database unavailable"));
    };

    let events: Collection<FeedbackEvent> = database.collection(COLLECTION_FEEDBACK_EVENTS);
    events
        .insert_one(&event)
        .await
        .map_err(|_| VerboseHTTPError::internal("Failed to record feedback event"))?;

    let skin_segment = SkinSegment::from_event(event.user_skin_type);
    let concern_segment = ConcernSegment::from_event(event.concern.as_deref());

    // Products without a parsed ingredient list yield no links; that is an
    // expected condition, not an error.
    let ingredient_ids = catalog::delegates::get_attributed_ingredients(&event.product_id).await?;
    if ingredient_ids.is_empty() {
        warn!(product_id = %event.product_id, "no attributed ingredients, skipping ingredient update");
    }

    let ingredients: Collection<IngredientEffectivenessRecord> =
        database.collection(COLLECTION_INGREDIENT_EFFECTIVENESS);

    let (positive, neutral, negative) = match event.reaction.class() {
        ReactionClass::Positive => (1, 0, 0),
        ReactionClass::Neutral => (0, 1, 0),
        ReactionClass::Negative => (0, 0, 1),
    };

    for ingredient_id in &ingredient_ids {
        let filter = ingredient_key_filter(ingredient_id, skin_segment, &concern_segment);

        let updated = ingredients
            .find_one_and_update(
                filter.clone(),
                doc! {
                    "$inc": {
                        "sample_size": 1_i64,
                        "positive_reports": positive as i64,
                        "neutral_reports": neutral as i64,
                        "negative_reports": negative as i64,
                    }
                },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|_| VerboseHTTPError::internal("Failed to update ingredient record"))?;

        let Some(record) = updated else {
            continue;
        };

        let score = ingredient_score(
            record.positive_reports,
            record.neutral_reports,
            record.sample_size,
        );

        let mut guard = filter;
        guard.insert("sample_size", record.sample_size);
        ingredients
            .update_one(guard, doc! { "$set": { "effectiveness_score": score } })
            .await
            .map_err(|_| VerboseHTTPError::internal("Failed to update ingredient score"))?;
    }

    // Reaction alone is enough for ingredient attribution; the product-level
    // running average needs an actual star rating.
    if let Some(rating) = event.rating {
        let products: Collection<ProductEffectivenessRecord> =
            database.collection(COLLECTION_PRODUCT_EFFECTIVENESS);

        let filter = product_key_filter(&event.product_id, skin_segment);

        let updated = products
            .find_one_and_update(
                filter.clone(),
                doc! {
                    "$inc": {
                        "sample_size": 1_i64,
                        "rating_sum": normalized_rating(rating),
                    }
                },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|_| VerboseHTTPError::internal("Failed to update product record"))?;

        if let Some(record) = updated {
            let score = product_score(record.rating_sum, record.sample_size);
            let mut guard = filter;
            guard.insert("sample_size", record.sample_size);
            products
                .update_one(guard, doc! { "$set": { "effectiveness_score": score } })
                .await
                .map_err(|_| VerboseHTTPError::internal("Failed to update product score"))?;
        }
    }

    info!(
        event_id = %event.event_id,
        product_id = %event.product_id,
        ingredients = ingredient_ids.len(),
        "feedback applied"
    );

    Ok(())
}

/// Batch path: rebuilds every effectiveness record from the full event
/// history. Exclusive maintenance job; must not interleave with
/// apply_feedback on the same keys. Records whose events have vanished are
/// reset to the empty state rather than deleted.
pub async fn recompute_all() -> Result<RecomputeSummary, VerboseHTTPError> {
    let Some(database) = DB.get() else {
        return Err(VerboseHTTPError::internal("Database unavailable"));
    };

    let events_collection: Collection<FeedbackEvent> =
        database.collection(COLLECTION_FEEDBACK_EVENTS);

    let cursor = events_collection
        .find(doc! {})
        .await
        .map_err(|_| VerboseHTTPError::internal("Database error"))?;

    let events: Vec<FeedbackEvent> = cursor
        .try_collect()
        .await
        .map_err(|_| VerboseHTTPError::internal("Database error"))?;

    info!(events = events.len(), "recomputing effectiveness records");

    let product_ids: Vec<String> = events
        .iter()
        .map(|event| event.product_id.clone())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let links = catalog::delegates::get_attributed_ingredients_for(&product_ids).await?;
    let (ingredient_counts, product_tallies) = fold_events(&events, &links);

    let ingredients: Collection<IngredientEffectivenessRecord> =
        database.collection(COLLECTION_INGREDIENT_EFFECTIVENESS);
    let products: Collection<ProductEffectivenessRecord> =
        database.collection(COLLECTION_PRODUCT_EFFECTIVENESS);

    let mut records_reset = 0usize;

    let existing_ingredients: Vec<IngredientEffectivenessRecord> = ingredients
        .find(doc! {})
        .await
        .map_err(|_| VerboseHTTPError::internal("Database error"))?
        .try_collect()
        .await
        .map_err(|_| VerboseHTTPError::internal("Database error"))?;

    for record in &existing_ingredients {
        let key = (
            record.ingredient_id.clone(),
            record.skin_segment,
            record.concern_segment.clone(),
        );
        if !ingredient_counts.contains_key(&key) && record.sample_size != 0 {
            ingredients
                .update_one(
                    ingredient_key_filter(&record.ingredient_id, record.skin_segment, &record.concern_segment),
                    doc! {
                        "$set": {
                            "sample_size": 0_i64,
                            "positive_reports": 0_i64,
                            "negative_reports": 0_i64,
                            "neutral_reports": 0_i64,
                            "effectiveness_score": 0.5,
                        }
                    },
                )
                .await
                .map_err(|_| VerboseHTTPError::internal("Failed to reset ingredient record"))?;
            records_reset += 1;
        }
    }

    for ((ingredient_id, skin_segment, concern_segment), counts) in &ingredient_counts {
        ingredients
            .update_one(
                ingredient_key_filter(ingredient_id, *skin_segment, concern_segment),
                doc! {
                    "$set": {
                        "sample_size": counts.sample_size(),
                        "positive_reports": counts.positive,
                        "negative_reports": counts.negative,
                        "neutral_reports": counts.neutral,
                        "effectiveness_score": counts.score(),
                    }
                },
            )
            .upsert(true)
            .await
            .map_err(|_| VerboseHTTPError::internal("Failed to write ingredient record"))?;
    }

    let existing_products: Vec<ProductEffectivenessRecord> = products
        .find(doc! {})
        .await
        .map_err(|_| VerboseHTTPError::internal("Database error"))?
        .try_collect()
        .await
        .map_err(|_| VerboseHTTPError::internal("Database error"))?;

    for record in &existing_products {
        let key = (record.product_id.clone(), record.skin_segment);
        if !product_tallies.contains_key(&key) && record.sample_size != 0 {
            products
                .update_one(
                    product_key_filter(&record.product_id, record.skin_segment),
                    doc! {
                        "$set": {
                            "sample_size": 0_i64,
                            "rating_sum": 0.0,
                            "effectiveness_score": 0.5,
                        }
                    },
                )
                .await
                .map_err(|_| VerboseHTTPError::internal("Failed to reset product record"))?;
            records_reset += 1;
        }
    }

    for ((product_id, skin_segment), tally) in &product_tallies {
        products
            .update_one(
                product_key_filter(product_id, *skin_segment),
                doc! {
                    "$set": {
                        "sample_size": tally.sample_size,
                        "rating_sum": tally.rating_sum,
                        "effectiveness_score": tally.score(),
                    }
                },
            )
            .upsert(true)
            .await
            .map_err(|_| VerboseHTTPError::internal("Failed to write product record"))?;
    }

    let summary = RecomputeSummary {
        events_replayed: events.len(),
        ingredient_records: ingredient_counts.len(),
        product_records: product_tallies.len(),
        records_reset,
    };

    info!(
        ingredient_records = summary.ingredient_records,
        product_records = summary.product_records,
        records_reset = summary.records_reset,
        "recompute finished"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::schemas::SkinType;
    use mongodb::bson::DateTime;

    fn event(
        product_id: &str,
        skin_type: Option<SkinType>,
        concern: Option<&str>,
        reaction: Reaction,
        rating: Option<i64>,
    ) -> FeedbackEvent {
        FeedbackEvent {
            id: None,
            event_id: format!("evt-{product_id}-{reaction:?}"),
            product_id: product_id.to_string(),
            user_skin_type: skin_type,
            concern: concern.map(str::to_string),
            reaction,
            rating,
            created_at: DateTime::now(),
        }
    }

    fn links(product_id: &str, ingredient_ids: &[&str]) -> HashMap<String, Vec<String>> {
        let mut map = HashMap::new();
        map.insert(
            product_id.to_string(),
            ingredient_ids.iter().map(|id| id.to_string()).collect(),
        );
        map
    }

    #[test]
    fn reaction_classes_are_exhaustive() {
        assert_eq!(Reaction::HolyGrail.class(), ReactionClass::Positive);
        assert_eq!(Reaction::Good.class(), ReactionClass::Positive);
        assert_eq!(Reaction::Okay.class(), ReactionClass::Neutral);
        assert_eq!(Reaction::Bad.class(), ReactionClass::Negative);
        assert_eq!(Reaction::BrokeMeOut.class(), ReactionClass::Negative);
    }

    #[test]
    fn ingredient_score_three_good_one_bad() {
        assert_eq!(ingredient_score(3, 0, 4), 0.75);
    }

    #[test]
    fn neutral_prior_at_zero_samples() {
        assert_eq!(ingredient_score(0, 0, 0), 0.5);
        assert_eq!(product_score(0.0, 0), 0.5);
    }

    #[test]
    fn scores_stay_in_unit_interval() {
        for positive in 0..5 {
            for neutral in 0..5 {
                for negative in 0..5 {
                    let score = ingredient_score(positive, neutral, positive + neutral + negative);
                    assert!((0.0..=1.0).contains(&score), "score {score} out of range");
                }
            }
        }
    }

    #[test]
    fn ratings_normalize_onto_unit_interval() {
        assert_eq!(normalized_rating(1), 0.0);
        assert_eq!(normalized_rating(3), 0.5);
        assert_eq!(normalized_rating(5), 1.0);
    }

    #[test]
    fn running_average_over_a_rating_sequence() {
        // Ratings 5, 4, 3 -> running averages 1.0, 0.875, 0.75.
        let events = vec![
            event("p1", Some(SkinType::Dry), None, Reaction::Good, Some(5)),
            event("p1", Some(SkinType::Dry), None, Reaction::Good, Some(4)),
            event("p1", Some(SkinType::Dry), None, Reaction::Good, Some(3)),
        ];
        let no_links = HashMap::new();
        let expected = [1.0, 0.875, 0.75];
        for (n, want) in expected.iter().enumerate() {
            let (_, tallies) = fold_events(&events[..=n], &no_links);
            let tally = &tallies[&("p1".to_string(), SkinSegment::Type(SkinType::Dry))];
            assert_eq!(tally.score(), *want);
            assert_eq!(tally.sample_size, n as i64 + 1);
        }
    }

    #[test]
    fn fold_counts_every_attributed_ingredient() {
        let events = vec![
            event("p1", Some(SkinType::Oily), None, Reaction::Good, None),
            event("p1", Some(SkinType::Oily), None, Reaction::Good, None),
            event("p1", Some(SkinType::Oily), None, Reaction::Good, None),
            event("p1", Some(SkinType::Oily), None, Reaction::Bad, None),
        ];
        let (counts, tallies) = fold_events(&events, &links("p1", &["niacinamide"]));
        assert!(tallies.is_empty(), "no ratings, no product tallies");

        let key = (
            "niacinamide".to_string(),
            SkinSegment::Type(SkinType::Oily),
            ConcernSegment::Any,
        );
        let counts = &counts[&key];
        assert_eq!(counts.positive, 3);
        assert_eq!(counts.negative, 1);
        assert_eq!(counts.neutral, 0);
        assert_eq!(counts.sample_size(), 4);
        assert_eq!(counts.score(), 0.75);
    }

    #[test]
    fn fold_is_order_independent() {
        let mut events = vec![
            event("p1", Some(SkinType::Oily), Some("acne"), Reaction::HolyGrail, Some(5)),
            event("p1", None, Some("acne"), Reaction::Okay, Some(3)),
            event("p1", Some(SkinType::Oily), None, Reaction::BrokeMeOut, Some(1)),
            event("p2", Some(SkinType::Dry), Some("redness"), Reaction::Good, None),
            event("p2", Some(SkinType::Dry), Some("redness"), Reaction::Bad, Some(2)),
        ];
        let mut all_links = links("p1", &["niacinamide", "zinc"]);
        all_links.extend(links("p2", &["squalane"]));

        let forward = fold_events(&events, &all_links);
        events.reverse();
        let backward = fold_events(&events, &all_links);
        events.rotate_left(2);
        let rotated = fold_events(&events, &all_links);

        assert_eq!(forward, backward);
        assert_eq!(forward, rotated);
    }

    #[test]
    fn fold_is_idempotent_over_a_fixed_history() {
        let events = vec![
            event("p1", Some(SkinType::Combination), Some("acne"), Reaction::Good, Some(4)),
            event("p1", Some(SkinType::Combination), Some("acne"), Reaction::Okay, None),
        ];
        let all_links = links("p1", &["salicylic-acid"]);
        let first = fold_events(&events, &all_links);
        let second = fold_events(&events, &all_links);
        assert_eq!(first, second);
    }

    #[test]
    fn missing_links_skip_ingredient_attribution() {
        let events = vec![event("p9", Some(SkinType::Dry), None, Reaction::Good, Some(5))];
        let (counts, tallies) = fold_events(&events, &HashMap::new());
        assert!(counts.is_empty());
        assert_eq!(tallies.len(), 1);
    }

    #[test]
    fn wildcard_segments_round_trip_through_keys() {
        assert_eq!(SkinSegment::Any.as_key(), "__all__");
        assert_eq!(SkinSegment::Type(SkinType::Oily).as_key(), "oily");
        assert_eq!(ConcernSegment::Any.as_key(), "__all__");
        assert_eq!(
            ConcernSegment::Concern("acne".to_string()).as_key(),
            "acne"
        );
    }
}

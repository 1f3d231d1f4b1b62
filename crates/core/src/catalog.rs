//! Indexed, read-only-after-build question catalog.
//!
//! Records keep their insertion order. Three indexes sit beside the record
//! list: id → position, topic → positions and difficulty → positions. The
//! position sets are `BTreeSet`s so every filtered result comes back in
//! insertion order without a sort.

use rand::Rng;
use rand::seq::index;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use thiserror::Error;

use crate::model::{Difficulty, QuestionId, QuestionRecord, QuestionRecordError, Topic};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("duplicate question id {0}")]
    DuplicateId(QuestionId),

    #[error("malformed question {id}: {source}")]
    Malformed {
        id: QuestionId,
        #[source]
        source: QuestionRecordError,
    },
}

/// Read-only question lookup, the narrow capability scoring needs.
pub trait QuestionLookup: Send + Sync {
    fn question(&self, id: QuestionId) -> Option<&QuestionRecord>;
}

//
// ─── FILTER ────────────────────────────────────────────────────────────────────
//

/// Selection constraints. Absent constraints do not participate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionFilter {
    pub topic: Option<Topic>,
    pub difficulty: Option<Difficulty>,
    pub exclude: HashSet<QuestionId>,
}

impl QuestionFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_topic(mut self, topic: Topic) -> Self {
        self.topic = Some(topic);
        self
    }

    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    #[must_use]
    pub fn excluding(mut self, ids: impl IntoIterator<Item = QuestionId>) -> Self {
        self.exclude.extend(ids);
        self
    }
}

/// Counts derived from the indexes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub total: usize,
    pub by_topic: BTreeMap<Topic, usize>,
    pub by_difficulty: BTreeMap<Difficulty, usize>,
    pub by_topic_difficulty: BTreeMap<Topic, BTreeMap<Difficulty, usize>>,
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<QuestionRecord>,
    by_id: HashMap<QuestionId, usize>,
    by_topic: BTreeMap<Topic, BTreeSet<usize>>,
    by_difficulty: BTreeMap<Difficulty, BTreeSet<usize>>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from pre-validated records, stopping at the first bad one.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` for a duplicate id or a record whose invariants fail.
    pub fn from_records(
        records: impl IntoIterator<Item = QuestionRecord>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for record in records {
            catalog.add_record(record)?;
        }
        Ok(catalog)
    }

    /// Insert a record and update every index.
    ///
    /// Records may arrive through deserialization, so their invariants are
    /// re-checked here.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateId` if the id is taken and
    /// `CatalogError::Malformed` if the record is invalid.
    pub fn add_record(&mut self, record: QuestionRecord) -> Result<(), CatalogError> {
        let id = record.id();
        if self.by_id.contains_key(&id) {
            return Err(CatalogError::DuplicateId(id));
        }
        let record = QuestionRecord::new(
            id,
            record.topic(),
            record.difficulty(),
            record.text(),
            record.options().clone(),
            record.correct_answer(),
        )
        .map_err(|source| CatalogError::Malformed { id, source })?;

        let position = self.records.len();
        self.by_id.insert(id, position);
        self.by_topic
            .entry(record.topic())
            .or_default()
            .insert(position);
        self.by_difficulty
            .entry(record.difficulty())
            .or_default()
            .insert(position);
        self.records.push(record);
        Ok(())
    }

    #[must_use]
    pub fn get_by_id(&self, id: QuestionId) -> Option<&QuestionRecord> {
        self.by_id.get(&id).map(|&position| &self.records[position])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in insertion order.
    #[must_use]
    pub fn records(&self) -> &[QuestionRecord] {
        &self.records
    }

    /// Records matching `filter`, in insertion order.
    #[must_use]
    pub fn filter(&self, filter: &QuestionFilter) -> Vec<&QuestionRecord> {
        self.candidate_positions(filter)
            .into_iter()
            .map(|position| &self.records[position])
            .collect()
    }

    /// Uniform random pick among the records matching `filter`, using the
    /// thread-local generator.
    #[must_use]
    pub fn random_match(&self, filter: &QuestionFilter) -> Option<&QuestionRecord> {
        self.random_match_with(filter, &mut rand::rng())
    }

    /// Uniform random pick among the records matching `filter`.
    pub fn random_match_with<R: Rng + ?Sized>(
        &self,
        filter: &QuestionFilter,
        rng: &mut R,
    ) -> Option<&QuestionRecord> {
        let candidates = self.candidate_positions(filter);
        if candidates.is_empty() {
            return None;
        }
        let pick = rng.random_range(0..candidates.len());
        Some(&self.records[candidates[pick]])
    }

    /// Up to `count` distinct random records matching `filter`.
    #[must_use]
    pub fn random_sample(&self, filter: &QuestionFilter, count: usize) -> Vec<&QuestionRecord> {
        let candidates = self.candidate_positions(filter);
        let amount = count.min(candidates.len());
        index::sample(&mut rand::rng(), candidates.len(), amount)
            .into_iter()
            .map(|i| &self.records[candidates[i]])
            .collect()
    }

    #[must_use]
    pub fn count(&self, filter: &QuestionFilter) -> usize {
        self.candidate_positions(filter).len()
    }

    #[must_use]
    pub fn available_topics(&self) -> BTreeSet<Topic> {
        self.by_topic.keys().copied().collect()
    }

    #[must_use]
    pub fn available_difficulties(&self) -> BTreeSet<Difficulty> {
        self.by_difficulty.keys().copied().collect()
    }

    /// Every (topic, difficulty) pair with at least one question.
    #[must_use]
    pub fn topic_difficulty_combinations(&self) -> Vec<(Topic, Difficulty)> {
        let mut combos = Vec::new();
        for (topic, topic_positions) in &self.by_topic {
            for (difficulty, difficulty_positions) in &self.by_difficulty {
                if !topic_positions.is_disjoint(difficulty_positions) {
                    combos.push((*topic, *difficulty));
                }
            }
        }
        combos
    }

    #[must_use]
    pub fn statistics(&self) -> CatalogStats {
        let mut by_topic_difficulty: BTreeMap<Topic, BTreeMap<Difficulty, usize>> =
            BTreeMap::new();
        for (topic, topic_positions) in &self.by_topic {
            for (difficulty, difficulty_positions) in &self.by_difficulty {
                let count = topic_positions.intersection(difficulty_positions).count();
                if count > 0 {
                    by_topic_difficulty
                        .entry(*topic)
                        .or_default()
                        .insert(*difficulty, count);
                }
            }
        }

        CatalogStats {
            total: self.records.len(),
            by_topic: self
                .by_topic
                .iter()
                .map(|(topic, positions)| (*topic, positions.len()))
                .collect(),
            by_difficulty: self
                .by_difficulty
                .iter()
                .map(|(difficulty, positions)| (*difficulty, positions.len()))
                .collect(),
            by_topic_difficulty,
        }
    }

    fn candidate_positions(&self, filter: &QuestionFilter) -> Vec<usize> {
        let empty = BTreeSet::new();
        let topic_set = filter
            .topic
            .map(|topic| self.by_topic.get(&topic).unwrap_or(&empty));
        let difficulty_set = filter
            .difficulty
            .map(|difficulty| self.by_difficulty.get(&difficulty).unwrap_or(&empty));

        let keep = |position: &usize| {
            !filter.exclude.contains(&self.records[*position].id())
        };

        match (topic_set, difficulty_set) {
            (Some(t), Some(d)) => t.intersection(d).copied().filter(keep).collect(),
            (Some(set), None) | (None, Some(set)) => set.iter().copied().filter(keep).collect(),
            (None, None) => (0..self.records.len()).filter(keep).collect(),
        }
    }
}

impl QuestionLookup for Catalog {
    fn question(&self, id: QuestionId) -> Option<&QuestionRecord> {
        self.get_by_id(id)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn record(id: u64, topic: Topic, difficulty: Difficulty) -> QuestionRecord {
        QuestionRecord::new(
            QuestionId::new(id),
            topic,
            difficulty,
            format!("Question {id}?"),
            [
                format!("a{id}"),
                format!("b{id}"),
                format!("c{id}"),
                format!("d{id}"),
            ],
            format!("a{id}"),
        )
        .unwrap()
    }

    fn build_catalog() -> Catalog {
        Catalog::from_records(vec![
            record(1, Topic::Physics, Difficulty::Easy),
            record(2, Topic::Physics, Difficulty::Hard),
            record(3, Topic::Chemistry, Difficulty::Easy),
            record(4, Topic::Physics, Difficulty::Easy),
            record(5, Topic::Math, Difficulty::Medium),
            record(6, Topic::Physics, Difficulty::Easy),
        ])
        .unwrap()
    }

    fn ids(records: &[&QuestionRecord]) -> Vec<u64> {
        records.iter().map(|r| r.id().value()).collect()
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut catalog = build_catalog();
        let err = catalog
            .add_record(record(3, Topic::Math, Difficulty::Hard))
            .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateId(QuestionId::new(3)));
        assert_eq!(catalog.len(), 6);
    }

    #[test]
    fn deserialized_records_are_revalidated() {
        let json = r#"{
            "id": 9, "topic": "Math", "difficulty": "Easy", "text": "2+2?",
            "options": ["3", "4", "5", "4"], "correct_answer": "4"
        }"#;
        let bad: QuestionRecord = serde_json::from_str(json).unwrap();
        let err = Catalog::new().add_record(bad).unwrap_err();
        assert!(matches!(err, CatalogError::Malformed { .. }));
    }

    #[test]
    fn lookup_by_id() {
        let catalog = build_catalog();
        let found = catalog.get_by_id(QuestionId::new(5)).unwrap();
        assert_eq!(found.topic(), Topic::Math);
        assert!(catalog.get_by_id(QuestionId::new(99)).is_none());
    }

    #[test]
    fn filter_intersects_present_constraints_in_insertion_order() {
        let catalog = build_catalog();

        let both = QuestionFilter::new()
            .with_topic(Topic::Physics)
            .with_difficulty(Difficulty::Easy);
        assert_eq!(ids(&catalog.filter(&both)), vec![1, 4, 6]);

        let easy = QuestionFilter::new().with_difficulty(Difficulty::Easy);
        assert_eq!(ids(&catalog.filter(&easy)), vec![1, 3, 4, 6]);

        let all = QuestionFilter::new();
        assert_eq!(catalog.count(&all), 6);

        let excluded = both.excluding([QuestionId::new(4)]);
        assert_eq!(ids(&catalog.filter(&excluded)), vec![1, 6]);
    }

    #[test]
    fn filter_on_absent_topic_is_empty() {
        let catalog = Catalog::from_records(vec![record(1, Topic::Physics, Difficulty::Easy)])
            .unwrap();
        let filter = QuestionFilter::new().with_topic(Topic::Math);
        assert!(catalog.filter(&filter).is_empty());
        assert!(catalog.random_match(&filter).is_none());
    }

    #[test]
    fn random_match_honours_exclusions() {
        let catalog = build_catalog();
        let filter = QuestionFilter::new()
            .with_topic(Topic::Physics)
            .with_difficulty(Difficulty::Easy)
            .excluding([QuestionId::new(1), QuestionId::new(6)]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let pick = catalog.random_match_with(&filter, &mut rng).unwrap();
            assert_eq!(pick.id(), QuestionId::new(4));
        }
    }

    #[test]
    fn random_match_is_uniform() {
        let catalog = build_catalog();
        let filter = QuestionFilter::new()
            .with_topic(Topic::Physics)
            .with_difficulty(Difficulty::Easy);
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen: HashMap<QuestionId, u32> = HashMap::new();

        for _ in 0..1000 {
            let pick = catalog.random_match_with(&filter, &mut rng).unwrap();
            *seen.entry(pick.id()).or_default() += 1;
        }

        assert_eq!(seen.len(), 3);
        let expected = 1000.0 / 3.0;
        for count in seen.values() {
            let deviation = (f64::from(*count) - expected).abs();
            assert!(deviation < expected * 0.25, "count {count} too far from {expected}");
        }
    }

    #[test]
    fn random_sample_is_distinct_and_capped() {
        let catalog = build_catalog();
        let filter = QuestionFilter::new().with_topic(Topic::Physics);
        let sample = catalog.random_sample(&filter, 10);
        let mut got = ids(&sample);
        got.sort_unstable();
        assert_eq!(got, vec![1, 2, 4, 6]);
    }

    #[test]
    fn available_sets_come_from_indexes() {
        let catalog = build_catalog();
        assert_eq!(
            catalog.available_topics().into_iter().collect::<Vec<_>>(),
            vec![Topic::Physics, Topic::Chemistry, Topic::Math]
        );
        assert!(!catalog.available_difficulties().is_empty());
        assert!(Catalog::new().available_topics().is_empty());
    }

    #[test]
    fn statistics_partition_the_catalog() {
        let catalog = build_catalog();
        let stats = catalog.statistics();

        assert_eq!(stats.total, 6);
        assert_eq!(stats.by_topic.values().sum::<usize>(), stats.total);
        assert_eq!(stats.by_difficulty.values().sum::<usize>(), stats.total);
        assert_eq!(stats.by_topic_difficulty[&Topic::Physics][&Difficulty::Easy], 3);
        assert_eq!(
            catalog.topic_difficulty_combinations(),
            vec![
                (Topic::Physics, Difficulty::Easy),
                (Topic::Physics, Difficulty::Hard),
                (Topic::Chemistry, Difficulty::Easy),
                (Topic::Math, Difficulty::Medium),
            ]
        );
    }
}

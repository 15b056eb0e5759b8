//! Child generation: select parents, breed, gate, persist.

use crate::schema::{ChildRequest, ProjectSchema, Record, SearchConfigError};
use crate::store::{RecordPool, StoreError};

use super::gate::{Rejection, accept};
use super::genome::{GenomeRng, RandomSource};
use super::selection::{SelectionError, select_parents};
use super::strategy::{BreedStrategy, GenerationError, Strategy};

/// Errors that abort a generation call.
///
/// Breeding failures and gate rejections are not errors: they are logged and
/// the call yields no child.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error("Record pool failed: {0}")]
    Store(#[from] StoreError),
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] SearchConfigError),
}

/// Breed one candidate from `parents`.
///
/// The strategy follows `parent_count` when given, otherwise the number of
/// parents. The candidate has not been through the duplicate/validity gate.
pub fn breed_child(
    schema: &ProjectSchema,
    parents: &[Record],
    parent_count: Option<usize>,
    spread: f64,
    rng: &mut dyn RandomSource,
) -> Result<Record, GenerationError> {
    let count = parent_count.unwrap_or(parents.len());
    Strategy::for_parent_count(count, spread).breed(schema, parents, rng)
}

/// A GA search session over one project's record pool.
pub struct GaSearch<P: RecordPool, R: RandomSource = GenomeRng> {
    schema: ProjectSchema,
    pool: P,
    rng: R,
}

impl<P: RecordPool> GaSearch<P, GenomeRng> {
    /// Create a session with an optionally seeded generator.
    pub fn with_seed(schema: ProjectSchema, pool: P, seed: Option<u64>) -> Self {
        Self::new(schema, pool, GenomeRng::from_seed(seed))
    }
}

impl<P: RecordPool, R: RandomSource> GaSearch<P, R> {
    pub fn new(schema: ProjectSchema, pool: P, rng: R) -> Self {
        Self { schema, pool, rng }
    }

    pub fn schema(&self) -> &ProjectSchema {
        &self.schema
    }

    pub fn pool(&self) -> &P {
        &self.pool
    }

    pub fn into_pool(self) -> P {
        self.pool
    }

    /// Generate, validate and store one child.
    ///
    /// Returns `Ok(None)` when breeding fails or the candidate is rejected;
    /// the reason is logged.
    pub fn generate_child(&mut self, request: &ChildRequest) -> Result<Option<Record>, SearchError> {
        self.generate_child_with(|r| request.query.matches(r), request)
    }

    /// Like [`generate_child`](Self::generate_child), filtering the pool with
    /// `predicate` instead of `request.query`.
    pub fn generate_child_with<F>(
        &mut self,
        predicate: F,
        request: &ChildRequest,
    ) -> Result<Option<Record>, SearchError>
    where
        F: Fn(&Record) -> bool,
    {
        request.validate()?;

        let pool = self.pool.all_records()?;
        let parents = select_parents(
            &pool,
            predicate,
            request.sort_field.as_deref(),
            request.ascending,
            request.limit,
        )?;

        let count = request.parent_count.unwrap_or(parents.len());
        let strategy = Strategy::for_parent_count(count, request.spread);
        log::debug!(
            "Breeding by {} from {} of {} pooled records",
            strategy,
            parents.len(),
            pool.len()
        );

        let candidate = match strategy.breed(&self.schema, &parents, &mut self.rng) {
            Ok(candidate) => candidate,
            Err(e) => {
                log::error!("Child generation failed ({}): {}", strategy, e);
                return Ok(None);
            }
        };

        let child = match accept(candidate, &parents, &self.schema) {
            Ok(child) => child,
            Err(Rejection::Duplicate) => {
                log::warn!("Duplicate child generated by {}", strategy);
                return Ok(None);
            }
            Err(rejection) => {
                log::error!("Generated child doesn't fit schema. {}", rejection);
                return Ok(None);
            }
        };

        self.pool.insert_record(&child)?;
        log::info!("Accepted child {:?}", child);
        Ok(Some(child))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::evolution::genome::ScriptedRng;
    use crate::compute::evolution::precision::truncate_to_precision;
    use crate::schema::{BaseType, CompareOp, FieldDescriptor, FitnessQuery};
    use crate::store::ProjectCache;
    use proptest::prelude::{any, prop, prop_assert, prop_assert_eq, proptest};
    use tempfile::tempdir;

    fn int_schema() -> ProjectSchema {
        ProjectSchema::new(vec![FieldDescriptor::new(
            "x",
            BaseType::Int,
            (0.0, 10.0),
            1.0,
        )])
        .unwrap()
    }

    #[test]
    fn test_mutation_scenario() {
        let pool = vec![Record::from_iter([("x", 5.0)])];
        let mut search = GaSearch::new(int_schema(), pool, ScriptedRng::minus(1));

        let child = search.generate_child(&ChildRequest::default()).unwrap();
        assert_eq!(child, Some(Record::from_iter([("x", 4.0)])));
        assert_eq!(search.pool().len(), 2);
    }

    #[test]
    fn test_random_generation_truncates_precision() {
        let schema = ProjectSchema::new(vec![
            FieldDescriptor::new("y", BaseType::Float, (0.0, 1.0), 0.1).with_precision(2),
        ])
        .unwrap();
        let mut search = GaSearch::new(schema, Vec::new(), ScriptedRng::new([0.5678]));

        let child = search.generate_child(&ChildRequest::default()).unwrap();
        assert_eq!(child, Some(Record::from_iter([("y", 0.56)])));
    }

    #[test]
    fn test_huge_range_with_precision_always_generates() {
        let schema = ProjectSchema::new(vec![
            FieldDescriptor::new("mass", BaseType::Double, (0.0, 1e30), 1e27).with_precision(3),
        ])
        .unwrap();
        // Nothing matches, so every call generates from scratch.
        let request = ChildRequest {
            query: FitnessQuery::compare("mass", CompareOp::Lt, -1.0),
            ..Default::default()
        };
        let mut search = GaSearch::with_seed(schema, Vec::new(), Some(1));

        for _ in 0..20 {
            let child = search.generate_child(&request).unwrap().unwrap();
            let mass = child.get("mass").unwrap();
            assert_eq!(truncate_to_precision(mass, 3), Some(mass));
        }
        assert_eq!(search.pool().len(), 20);
    }

    #[test]
    fn test_sort_on_empty_pool_still_generates() {
        let request = ChildRequest {
            sort_field: Some("height".to_string()),
            ..Default::default()
        };
        let mut search = GaSearch::with_seed(int_schema(), Vec::new(), Some(1));
        let child = search.generate_child(&request).unwrap().unwrap();
        assert!(child.contains("x"));
    }

    #[test]
    fn test_zero_parent_generation_is_seeded() {
        let schema = ProjectSchema::new(vec![
            FieldDescriptor::new("a", BaseType::Double, (-5.0, 5.0), 0.5),
            FieldDescriptor::new("b", BaseType::Int, (0.0, 1000.0), 1.0),
        ])
        .unwrap();

        let mut first = GaSearch::with_seed(schema.clone(), Vec::new(), Some(2024));
        let mut second = GaSearch::with_seed(schema, Vec::new(), Some(2024));
        let request = ChildRequest::default();

        assert_eq!(
            first.generate_child(&request).unwrap(),
            second.generate_child(&request).unwrap()
        );
    }

    #[test]
    fn test_duplicate_child_is_not_stored() {
        let schema = ProjectSchema::new(vec![FieldDescriptor::new(
            "x",
            BaseType::Int,
            (5.0, 5.0),
            1.0,
        )])
        .unwrap();
        let pool = vec![Record::from_iter([("x", 5.0)])];
        let mut search = GaSearch::new(schema, pool, ScriptedRng::plus(1));

        assert_eq!(search.generate_child(&ChildRequest::default()).unwrap(), None);
        assert_eq!(search.pool().len(), 1);
    }

    #[test]
    fn test_generation_failure_yields_none() {
        let request = ChildRequest {
            parent_count: Some(1),
            ..Default::default()
        };
        let mut search = GaSearch::new(int_schema(), Vec::new(), ScriptedRng::new([]));
        assert_eq!(search.generate_child(&request).unwrap(), None);
        assert!(search.pool().is_empty());
    }

    #[test]
    fn test_parent_count_override_forces_generation() {
        let request = ChildRequest {
            parent_count: Some(0),
            ..Default::default()
        };
        let pool = vec![
            Record::from_iter([("x", 1.0)]),
            Record::from_iter([("x", 9.0)]),
        ];
        // One draw only: the random integer for x.
        let mut search = GaSearch::new(int_schema(), pool, ScriptedRng::new([0.5]));
        let child = search.generate_child(&request).unwrap();
        assert_eq!(child, Some(Record::from_iter([("x", 5.0)])));
    }

    #[test]
    fn test_schema_violation_is_rejected() {
        let pool = vec![
            Record::from_iter([("x", 2.0)]),
            Record::from_iter([("x", 5.0)]),
        ];
        // Parents #0 and #1, breed coin, t = 0.5: midpoint 3.5 is not an integer.
        let rng = ScriptedRng::new([0.1, 0.9, 0.9, 0.5]);
        let mut search = GaSearch::new(int_schema(), pool, rng);
        assert_eq!(search.generate_child(&ChildRequest::default()).unwrap(), None);
        assert_eq!(search.pool().len(), 2);
    }

    #[test]
    fn test_missing_sort_field_aborts() {
        let pool = vec![Record::from_iter([("x", 5.0)])];
        let request = ChildRequest {
            sort_field: Some("height".to_string()),
            ..Default::default()
        };
        let mut search = GaSearch::with_seed(int_schema(), pool, Some(0));
        assert!(matches!(
            search.generate_child(&request),
            Err(SearchError::Selection(SelectionError::FieldNotFound { .. }))
        ));
    }

    #[test]
    fn test_invalid_spread_aborts() {
        let request = ChildRequest {
            spread: f64::NAN,
            ..Default::default()
        };
        let mut search = GaSearch::with_seed(int_schema(), Vec::new(), Some(0));
        assert!(matches!(
            search.generate_child(&request),
            Err(SearchError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_query_filters_parent_pool() {
        let pool = vec![
            Record::from_iter([("x", 3.0)]),
            Record::from_iter([("x", 9.0)]),
        ];
        let request = ChildRequest {
            query: FitnessQuery::compare("x", CompareOp::Gt, 5.0),
            ..Default::default()
        };
        // Only {x: 9} survives the filter, so this is a mutation of it.
        let mut search = GaSearch::new(int_schema(), pool, ScriptedRng::plus(1));
        let child = search.generate_child(&request).unwrap();
        assert_eq!(child, Some(Record::from_iter([("x", 10.0)])));
    }

    #[test]
    fn test_closure_predicate() {
        let pool = vec![
            Record::from_iter([("x", 3.0)]),
            Record::from_iter([("x", 9.0)]),
        ];
        let mut search = GaSearch::new(int_schema(), pool, ScriptedRng::minus(1));
        let child = search
            .generate_child_with(|r| r.get("x") == Some(3.0), &ChildRequest::default())
            .unwrap();
        assert_eq!(child, Some(Record::from_iter([("x", 2.0)])));
    }

    #[test]
    fn test_accepted_child_persisted_to_cache() {
        let dir = tempdir().unwrap();
        let mut cache = ProjectCache::open(dir.path(), "p1").unwrap();
        cache
            .insert_record(&Record::from_iter([("x", 5.0)]))
            .unwrap();

        let mut search = GaSearch::new(int_schema(), cache, ScriptedRng::plus(1));
        let child = search.generate_child(&ChildRequest::default()).unwrap();
        assert_eq!(child, Some(Record::from_iter([("x", 6.0)])));

        let reopened = ProjectCache::open(dir.path(), "p1").unwrap();
        assert_eq!(reopened.all_records().unwrap().len(), 2);
    }

    #[test]
    fn test_breed_child_follows_override() {
        let parents = vec![Record::from_iter([("x", 5.0)])];
        let child = breed_child(
            &int_schema(),
            &parents,
            Some(0),
            0.5,
            &mut ScriptedRng::new([0.0]),
        )
        .unwrap();
        assert_eq!(child.get("x"), Some(0.0));
    }

    fn field_strategy() -> impl proptest::strategy::Strategy<Value = (bool, f64, f64, f64, Option<u32>)> {
        (
            any::<bool>(),
            -100.0f64..100.0,
            0.0f64..100.0,
            0.01f64..10.0,
            prop::option::of(1u32..6),
        )
    }

    proptest! {
        #[test]
        fn accepted_children_respect_schema(
            specs in prop::collection::vec(field_strategy(), 1..4),
            parent_count in 0usize..4,
            seed in any::<u64>(),
        ) {
            let fields = specs
                .iter()
                .enumerate()
                .map(|(i, &(is_int, min, width, step, precision))| {
                    let base_type = if is_int { BaseType::Int } else { BaseType::Double };
                    FieldDescriptor {
                        name: format!("f{}", i),
                        base_type,
                        range: (min, min + width),
                        step,
                        precision,
                    }
                })
                .collect();
            let schema = ProjectSchema::new(fields).unwrap();

            let mut rng = GenomeRng::new(seed);
            let parents: Vec<Record> = (0..parent_count)
                .map(|_| breed_child(&schema, &[], None, 0.5, &mut rng).unwrap())
                .collect();

            let mut search = GaSearch::new(schema.clone(), parents.clone(), rng);
            if let Some(child) = search.generate_child(&ChildRequest::default()).unwrap() {
                for field in schema.fields() {
                    let value = child.get(&field.name).unwrap();
                    prop_assert!(value >= field.min() && value <= field.max());
                    if let Some(p) = field.precision {
                        prop_assert_eq!(truncate_to_precision(value, p), Some(value));
                    }
                }
                prop_assert!(!parents.iter().any(|p| p.same_genes(&child)));
            }
        }
    }
}

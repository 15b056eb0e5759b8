//! Parent pool selection: filter, sort, limit.

use crate::schema::{ChildRequest, Record};

/// Parent selection errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SelectionError {
    #[error("Field {field} not present in parent pool")]
    FieldNotFound { field: String },
}

/// Sort `pool` by `field`, ascending or descending.
///
/// Records with equal keys keep their pool order. Fails if any record lacks
/// the field; an empty pool sorts to an empty pool.
pub fn sort_pool(
    pool: Vec<Record>,
    field: &str,
    ascending: bool,
) -> Result<Vec<Record>, SelectionError> {
    let mut keyed = Vec::with_capacity(pool.len());
    for record in pool {
        let key = record
            .get(field)
            .ok_or_else(|| SelectionError::FieldNotFound {
                field: field.to_string(),
            })?;
        keyed.push((key, record));
    }

    if ascending {
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    } else {
        keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
    }

    Ok(keyed.into_iter().map(|(_, record)| record).collect())
}

/// Select the parent set from `pool`.
///
/// Keeps records passing `predicate`, optionally sorts them by `sort_field`,
/// then keeps at most `limit` leading records.
pub fn select_parents<P>(
    pool: &[Record],
    predicate: P,
    sort_field: Option<&str>,
    ascending: bool,
    limit: Option<usize>,
) -> Result<Vec<Record>, SelectionError>
where
    P: Fn(&Record) -> bool,
{
    let mut parents: Vec<Record> = pool.iter().filter(|r| predicate(r)).cloned().collect();

    if let Some(field) = sort_field {
        parents = sort_pool(parents, field, ascending)?;
    }
    if let Some(limit) = limit {
        parents.truncate(limit);
    }

    Ok(parents)
}

/// Select the parent set described by a request.
pub fn select_for_request(
    pool: &[Record],
    request: &ChildRequest,
) -> Result<Vec<Record>, SelectionError> {
    select_parents(
        pool,
        |r| request.query.matches(r),
        request.sort_field.as_deref(),
        request.ascending,
        request.limit,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CompareOp, FitnessQuery};

    fn pool() -> Vec<Record> {
        vec![
            Record::from_iter([("step", 10.0), ("height", 2.0)]),
            Record::from_iter([("step", 70.0), ("height", 9.0)]),
            Record::from_iter([("step", 30.0), ("height", 5.0)]),
            Record::from_iter([("step", 50.0), ("height", 1.0)]),
        ]
    }

    fn heights(records: &[Record]) -> Vec<f64> {
        records.iter().map(|r| r.get("height").unwrap()).collect()
    }

    #[test]
    fn test_sort_empty_pool() {
        let sorted = sort_pool(Vec::new(), "height", true).unwrap();
        assert!(sorted.is_empty());
    }

    #[test]
    fn test_sort_directions() {
        let asc = sort_pool(pool(), "height", true).unwrap();
        assert_eq!(heights(&asc), vec![1.0, 2.0, 5.0, 9.0]);

        let desc = sort_pool(pool(), "height", false).unwrap();
        assert_eq!(heights(&desc), vec![9.0, 5.0, 2.0, 1.0]);
    }

    #[test]
    fn test_sort_is_stable() {
        let records = vec![
            Record::from_iter([("k", 1.0), ("id", 0.0)]),
            Record::from_iter([("k", 1.0), ("id", 1.0)]),
            Record::from_iter([("k", 0.0), ("id", 2.0)]),
        ];
        let ids: Vec<_> = sort_pool(records, "k", false)
            .unwrap()
            .iter()
            .map(|r| r.get("id").unwrap())
            .collect();
        assert_eq!(ids, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_sort_missing_field() {
        let mut records = pool();
        records.push(Record::from_iter([("step", 1.0)]));
        let err = sort_pool(records, "height", true).unwrap_err();
        assert_eq!(
            err,
            SelectionError::FieldNotFound {
                field: "height".to_string()
            }
        );
    }

    #[test]
    fn test_select_filter_sort_limit() {
        let parents = select_parents(
            &pool(),
            |r| r.get("step").is_some_and(|s| s < 59.0),
            Some("height"),
            false,
            Some(2),
        )
        .unwrap();
        assert_eq!(heights(&parents), vec![5.0, 2.0]);
    }

    #[test]
    fn test_select_without_sort_keeps_pool_order() {
        let parents = select_parents(&pool(), |_| true, None, true, Some(3)).unwrap();
        assert_eq!(heights(&parents), vec![2.0, 9.0, 5.0]);
    }

    #[test]
    fn test_select_for_request() {
        let request = ChildRequest {
            query: FitnessQuery::compare("step", CompareOp::Gt, 20.0),
            sort_field: Some("height".to_string()),
            ascending: true,
            limit: Some(1),
            ..Default::default()
        };
        let parents = select_for_request(&pool(), &request).unwrap();
        assert_eq!(heights(&parents), vec![1.0]);
    }

    #[test]
    fn test_filtered_out_records_do_not_fail_sort() {
        let mut records = pool();
        records.push(Record::from_iter([("step", 99.0)]));
        let parents = select_parents(
            &records,
            |r| r.get("step").is_some_and(|s| s < 59.0),
            Some("height"),
            true,
            None,
        )
        .unwrap();
        assert_eq!(parents.len(), 3);
    }
}

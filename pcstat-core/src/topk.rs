use crate::{CacheStatus, PcError, PcResult};

/// Returns the `k` records with the most cached pages, most cached first.
///
/// Records with the same number of cached pages keep their original relative order.  Asking
/// for more records than there are is an error rather than a silent truncation.
pub fn top_k(mut records: Vec<CacheStatus>, k: usize) -> PcResult<Vec<CacheStatus>> {
    if k > records.len() {
        return Err(PcError::InsufficientData {
            requested: k,
            available: records.len(),
        });
    }

    // sort_by is stable, which gives the tie ordering
    records.sort_by(|a, b| b.cached.cmp(&a.cached));
    records.truncate(k);
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResidencyBitmap;
    use chrono::Local;

    fn record(name: &str, cached: usize, pages: usize) -> CacheStatus {
        let now = Local::now();
        let bitmap: ResidencyBitmap = (0..pages).map(|i| i < cached).collect();
        CacheStatus::aggregate(name, bitmap, pages as u64 * 4096, now, now).unwrap()
    }

    #[test]
    fn test_top_k_order() {
        let records = vec![
            record("a", 1, 10),
            record("b", 7, 10),
            record("c", 3, 10),
            record("d", 7, 8),
        ];
        let top = top_k(records, 3).unwrap();
        let names: Vec<_> = top.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["b", "d", "c"]);
    }

    #[test]
    fn test_top_k_all_and_none() {
        let records = vec![record("a", 1, 2), record("b", 2, 2)];
        assert_eq!(top_k(records.clone(), 2).unwrap().len(), 2);
        assert!(top_k(records, 0).unwrap().is_empty());
    }

    #[test]
    fn test_top_k_insufficient() {
        let records = vec![record("a", 1, 2), record("b", 2, 2), record("c", 0, 2)];
        match top_k(records, 5) {
            Err(PcError::InsufficientData { requested, available }) => {
                assert_eq!(requested, 5);
                assert_eq!(available, 3);
            }
            x => panic!("Unexpected return value: {:?}", x),
        }
    }
}

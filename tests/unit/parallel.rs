//! Tests for work splitting.

use shapley_oracle::parallel::{chunk, split_budget};

#[test]
fn budget_shares_differ_by_at_most_one() {
    for total in 0..50 {
        for n_jobs in 1..9 {
            let plan = split_budget(total, n_jobs);
            assert_eq!(plan.iter().sum::<usize>(), total);
            assert_eq!(plan.len(), total.min(n_jobs));
            assert!(plan.iter().all(|&share| share >= 1));
            if let (Some(max), Some(min)) = (plan.iter().max(), plan.iter().min()) {
                assert!(max - min <= 1);
            }
        }
    }
}

#[test]
fn chunks_cover_items_in_order() {
    let items: Vec<usize> = (0..23).collect();
    for n_jobs in 1..30 {
        let chunks = chunk(&items, n_jobs);
        let flat: Vec<usize> = chunks.iter().flat_map(|c| c.iter().copied()).collect();
        assert_eq!(flat, items);
        assert!(chunks.iter().all(|c| !c.is_empty()));
    }
}

use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rankulator_core::{
    apply_batch, assign_tiers, assign_tiers_with, generate_random_batch,
    generate_score_based_batch, Batch, Item, Phase, Pool, Sampling, Selection, TierBand,
    TieringOptions,
};

fn pool_with_scores(scores: &[i64]) -> Pool {
    let items = scores
        .iter()
        .enumerate()
        .map(|(i, &s)| Item::new(format!("id{i}"), format!("Item {i}")).with_score(s))
        .collect();
    Pool::new(items).unwrap()
}

proptest! {
    #[test]
    fn deltas_sum_to_zero(
        scores in prop::collection::vec(-50i64..50, 1..30),
        picks in prop::collection::vec(any::<bool>(), 30),
        batch_size in 1usize..12,
        seed in any::<u64>(),
    ) {
        let mut pool = pool_with_scores(&scores);
        let mut rng = SmallRng::seed_from_u64(seed);
        let ids = generate_random_batch(&pool, batch_size, &mut rng).unwrap();
        let selection = Selection::from_ids(
            ids.iter().zip(&picks).filter(|(_, p)| **p).map(|(id, _)| id.clone()),
        );
        let batch = Batch::new(0, Phase::Exploration, Sampling::Random, ids);

        let before: i64 = pool.scores().iter().sum();
        let deltas = apply_batch(&mut pool, &batch, &selection).unwrap();
        prop_assert_eq!(deltas.iter().map(|d| d.delta).sum::<i64>(), 0);
        prop_assert_eq!(pool.scores().iter().sum::<i64>(), before);
        prop_assert_eq!(deltas.len(), batch.len());
    }

    #[test]
    fn skip_and_select_all_change_nothing(
        scores in prop::collection::vec(-50i64..50, 1..30),
        batch_size in 1usize..12,
        seed in any::<u64>(),
    ) {
        let mut pool = pool_with_scores(&scores);
        let mut rng = SmallRng::seed_from_u64(seed);
        let ids = generate_random_batch(&pool, batch_size, &mut rng).unwrap();
        let batch = Batch::new(0, Phase::Exploration, Sampling::Random, ids);

        apply_batch(&mut pool, &batch, &Selection::none()).unwrap();
        apply_batch(&mut pool, &batch, &Selection::all(&batch)).unwrap();
        prop_assert_eq!(pool.scores(), scores);
    }

    #[test]
    fn score_batch_is_a_contiguous_rank_window(
        scores in prop::collection::vec(-20i64..20, 1..40),
        batch_size in 1usize..10,
        seed in any::<u64>(),
    ) {
        let pool = pool_with_scores(&scores);
        let mut rng = SmallRng::seed_from_u64(seed);
        let ids = generate_score_based_batch(&pool, batch_size, &mut rng).unwrap();
        let k = batch_size.min(scores.len());
        prop_assert_eq!(ids.len(), k);

        let mut batch_scores: Vec<i64> = ids.iter().map(|id| pool.get(id).unwrap().score).collect();
        batch_scores.sort_unstable_by(|a, b| b.cmp(a));
        let mut sorted = scores.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));

        let is_window = sorted.windows(k).any(|w| w == batch_scores.as_slice());
        prop_assert!(is_window, "batch {:?} is not a window of {:?}", batch_scores, sorted);
    }

    #[test]
    fn tiering_is_idempotent(scores in prop::collection::vec(-100i64..100, 0..60)) {
        let pool = pool_with_scores(&scores);
        let bands = TierBand::default_bands();
        let first = assign_tiers(&pool, &bands).unwrap();
        let second = assign_tiers(&pool, &bands).unwrap();
        prop_assert_eq!(first.len(), scores.len());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn soft_caps_hold_above_lowest_band(scores in prop::collection::vec(-100i64..100, 1..80)) {
        let pool = pool_with_scores(&scores);
        let bands = TierBand::default_bands();
        let options = TieringOptions { fuzzy_threshold: None, ..TieringOptions::default() };
        let results = assign_tiers_with(&pool, &bands, &options).unwrap();

        for (idx, band) in bands.iter().enumerate().take(bands.len() - 1) {
            let count = results.iter().filter(|r| r.tier == idx + 1).count();
            prop_assert!(count <= band.soft_cap, "{} holds {} > {}", band.label, count, band.soft_cap);
        }
    }

    #[test]
    fn identical_scores_are_neutral(score in -100i64..100, n in 1usize..=10) {
        let pool = pool_with_scores(&vec![score; n]);
        let results = assign_tiers(&pool, &TierBand::default_bands()).unwrap();
        for r in &results {
            prop_assert_eq!(r.z_score, 0.0);
            prop_assert_eq!(r.tier_label.as_str(), "Tier 2");
        }
    }
}

#[test]
fn exploration_covers_items_evenly() {
    let pool = pool_with_scores(&[0; 10]);
    let mut rng = SmallRng::seed_from_u64(2024);
    let batches = 30_000;
    let mut appearances = vec![0usize; 10];

    for _ in 0..batches {
        for id in generate_random_batch(&pool, 3, &mut rng).unwrap() {
            appearances[id[2..].parse::<usize>().unwrap()] += 1;
        }
    }

    let expected = batches as f64 * 3.0 / 10.0;
    for (i, &count) in appearances.iter().enumerate() {
        let ratio = count as f64 / expected;
        assert!((ratio - 1.0).abs() < 0.05, "item {i} appeared {count} times, expected ~{expected}");
    }
}

#[test]
fn six_item_scenario_tiers() {
    let pool = pool_with_scores(&[10, 8, 8, 0, -4, -10]);
    let results = assign_tiers(&pool, &TierBand::default_bands()).unwrap();
    let label_of = |id: &str| results.iter().find(|r| r.id == id).unwrap().tier_label.clone();
    assert_eq!(label_of("id0"), "Elite");
    assert_eq!(label_of("id3"), "Tier 2");
    assert_eq!(label_of("id5"), "Tier 4");
}

use rand::Rng;

/// Picks `count` of `pool_size` positions uniformly at random, as a mask.
///
/// Robert Floyd's algorithm: O(count) draws, no shuffle of the whole pool.
///
/// # Panics
///
/// If `count > pool_size`.
pub fn sample_subset<R: Rng + ?Sized>(rng: &mut R, pool_size: usize, count: usize) -> Vec<bool> {
    assert!(
        count <= pool_size,
        "cannot choose {count} of {pool_size} positions"
    );
    let mut mask = vec![false; pool_size];
    for j in pool_size - count + 1..=pool_size {
        let r = rng.random_range(1..=j);
        if mask[r - 1] {
            mask[j - 1] = true;
        } else {
            mask[r - 1] = true;
        }
    }
    mask
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_exact_count() {
        let mut rng = StdRng::seed_from_u64(7);
        for (pool, count) in [(1, 0), (1, 1), (10, 3), (100, 99), (64, 32)] {
            let mask = sample_subset(&mut rng, pool, count);
            assert_eq!(mask.len(), pool);
            assert_eq!(mask.iter().filter(|&&b| b).count(), count);
        }
    }

    #[test]
    fn test_edge_counts() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20 {
            assert!(sample_subset(&mut rng, 6, 0).iter().all(|&b| !b));
            assert!(sample_subset(&mut rng, 6, 6).iter().all(|&b| b));
        }
        assert!(sample_subset(&mut rng, 0, 0).is_empty());
    }

    #[test]
    fn test_uniform_over_five_choose_two() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let trials = 100_000;
        let mut seen: HashMap<Vec<bool>, usize> = HashMap::new();
        for _ in 0..trials {
            *seen.entry(sample_subset(&mut rng, 5, 2)).or_default() += 1;
        }

        assert_eq!(seen.len(), 10);
        let expected = trials as f64 / 10.0;
        for (mask, hits) in &seen {
            let deviation = (*hits as f64 - expected).abs() / expected;
            assert!(deviation < 0.05, "{mask:?} drawn {hits} times");
        }
    }

    #[test]
    #[should_panic(expected = "cannot choose 4 of 3 positions")]
    fn test_count_larger_than_pool_panics() {
        let mut rng = StdRng::seed_from_u64(0);
        sample_subset(&mut rng, 3, 4);
    }
}

use rand::Rng;

/// Draws `length` items, each uniform over `0..=max_value`.
///
/// Inputs are assumed valid; bounds are enforced by `TrialSettings::validate`.
pub fn generate<R: Rng + ?Sized>(rng: &mut R, length: usize, max_value: u32) -> Vec<u32> {
    (0..length).map(|_| rng.random_range(0..=max_value)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn produces_requested_length_within_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for length in 4..=14 {
            for max in [0, 1, 9, 99, 9_999] {
                let seq = generate(&mut rng, length, max);
                assert_eq!(seq.len(), length);
                assert!(seq.iter().all(|&v| v <= max));
            }
        }
    }

    #[test]
    fn zero_range_yields_all_zeros() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(generate(&mut rng, 5, 0), vec![0; 5]);
    }

    #[test]
    fn covers_both_ends_of_the_closed_interval() {
        let mut rng = StdRng::seed_from_u64(42);
        let seq = generate(&mut rng, 2_000, 3);
        for v in 0..=3 {
            assert!(seq.contains(&v), "value {v} never drawn");
        }
    }
}

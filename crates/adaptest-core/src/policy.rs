//! Adaptive-phase level selection.

use rand::Rng;

use crate::model::{DifficultyLevel, LevelPolicy};

/// Probability of picking the primary level of a weighted band.
pub const PRIMARY_WEIGHT: f64 = 0.7;

/// Score at or above which the hardest band is used.
pub const HIGH_BAND: u32 = 40;

/// Score at or above which the middle band is used.
pub const MID_BAND: u32 = 20;

/// Deterministic selection: a pure function of the cumulative score.
pub fn deterministic_level(score: u32) -> DifficultyLevel {
    if score >= HIGH_BAND {
        DifficultyLevel::Four
    } else if score >= MID_BAND {
        DifficultyLevel::Three
    } else {
        DifficultyLevel::One
    }
}

/// The `(primary, secondary)` levels of the weighted band for `score`.
pub fn weighted_band(score: u32) -> (DifficultyLevel, DifficultyLevel) {
    if score >= HIGH_BAND {
        (DifficultyLevel::Four, DifficultyLevel::Three)
    } else if score >= MID_BAND {
        (DifficultyLevel::Three, DifficultyLevel::Two)
    } else {
        (DifficultyLevel::One, DifficultyLevel::Two)
    }
}

/// Pick the next adaptive-phase level.
///
/// The weighted policy consumes exactly one draw from `rng`; the
/// deterministic policy never touches it.
pub fn select_level<R: Rng + ?Sized>(policy: LevelPolicy, score: u32, rng: &mut R) -> DifficultyLevel {
    match policy {
        LevelPolicy::Deterministic => deterministic_level(score),
        LevelPolicy::Weighted => {
            let (primary, secondary) = weighted_band(score);
            if rng.random::<f64>() < PRIMARY_WEIGHT {
                primary
            } else {
                secondary
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn deterministic_bands() {
        assert_eq!(deterministic_level(0), DifficultyLevel::One);
        assert_eq!(deterministic_level(19), DifficultyLevel::One);
        assert_eq!(deterministic_level(20), DifficultyLevel::Three);
        assert_eq!(deterministic_level(39), DifficultyLevel::Three);
        assert_eq!(deterministic_level(40), DifficultyLevel::Four);
        assert_eq!(deterministic_level(500), DifficultyLevel::Four);
    }

    #[test]
    fn deterministic_never_picks_level_two() {
        let mut rng = StdRng::seed_from_u64(1);
        for score in 0..200 {
            let level = select_level(LevelPolicy::Deterministic, score, &mut rng);
            assert_ne!(level, DifficultyLevel::Two, "score {score}");
        }
    }

    #[test]
    fn weighted_stays_inside_band() {
        let mut rng = StdRng::seed_from_u64(7);
        for score in [0, 15, 20, 35, 40, 95] {
            let (primary, secondary) = weighted_band(score);
            for _ in 0..50 {
                let level = select_level(LevelPolicy::Weighted, score, &mut rng);
                assert!(level == primary || level == secondary, "score {score}: {level}");
            }
        }
    }

    #[test]
    fn weighted_prefers_primary() {
        let mut rng = StdRng::seed_from_u64(42);
        let trials = 2000;
        let primary = (0..trials)
            .filter(|_| select_level(LevelPolicy::Weighted, 50, &mut rng) == DifficultyLevel::Four)
            .count();
        let share = primary as f64 / trials as f64;
        assert!((0.62..0.78).contains(&share), "primary share {share}");
    }

    #[test]
    fn weighted_is_reproducible_with_seed() {
        let picks = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..20)
                .map(|i| select_level(LevelPolicy::Weighted, i * 5, &mut rng))
                .collect::<Vec<_>>()
        };
        assert_eq!(picks(9), picks(9));
    }
}

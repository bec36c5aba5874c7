//! Star rating from deflector usage

use super::level::LevelDescriptor;

/// Stars earned for winning with `deflectors_placed` placements (1..=3)
pub fn stars(deflectors_placed: u32, level: &LevelDescriptor) -> u8 {
    if deflectors_placed <= level.three_star_max {
        3
    } else if deflectors_placed <= level.two_star_max {
        2
    } else {
        1
    }
}

/// Placements over the three-star limit, if any
pub fn missed_top_tier_by(deflectors_placed: u32, level: &LevelDescriptor) -> Option<u32> {
    deflectors_placed
        .checked_sub(level.three_star_max)
        .filter(|&over| over > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_tiers() {
        let level = LevelDescriptor::aligned(1).with_star_thresholds(2, 4);
        assert_eq!(stars(0, &level), 3);
        assert_eq!(stars(2, &level), 3);
        assert_eq!(stars(3, &level), 2);
        assert_eq!(stars(4, &level), 2);
        assert_eq!(stars(5, &level), 1);
    }

    #[test]
    fn test_missed_top_tier() {
        let level = LevelDescriptor::aligned(1).with_star_thresholds(2, 4);
        assert_eq!(missed_top_tier_by(1, &level), None);
        assert_eq!(missed_top_tier_by(2, &level), None);
        assert_eq!(missed_top_tier_by(5, &level), Some(3));
    }
}

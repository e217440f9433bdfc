// Level curve: maps cumulative XP to a displayed level.
//
// Advancing from level L to L + 1 costs 5·L² + 50·L + 100 XP, and level 0
// starts at 0 XP. The thresholds are therefore 0, 100, 255, 475, 770, ...
// This is pure math with no side effects, so it lives outside the services.

/// Where a cumulative XP total sits on the curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelProgress {
    pub level: u32,
    /// Cumulative XP at which `level` was reached.
    pub xp_at_level_start: u64,
    /// XP needed to go from `level` to `level + 1`.
    pub xp_for_next_level: u64,
}

impl LevelProgress {
    /// XP earned inside the current level.
    pub fn xp_in_level(&self, total_xp: u64) -> u64 {
        total_xp.saturating_sub(self.xp_at_level_start)
    }
}

/// XP needed to advance from `level` to `level + 1`.
pub fn xp_to_advance(level: u32) -> u64 {
    let l = level as u64;
    5 * l * l + 50 * l + 100
}

/// Locate `xp` on the curve.
pub fn level_of(xp: u64) -> LevelProgress {
    let mut level = 0u32;
    let mut start = 0u64;
    loop {
        let span = xp_to_advance(level);
        match start.checked_add(span) {
            Some(next_start) if next_start <= xp => {
                start = next_start;
                level += 1;
            }
            _ => {
                return LevelProgress {
                    level,
                    xp_at_level_start: start,
                    xp_for_next_level: span,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_follow_the_curve() {
        assert_eq!(level_of(0).level, 0);
        assert_eq!(level_of(99).level, 0);
        assert_eq!(level_of(100).level, 1);
        assert_eq!(level_of(254).level, 1);
        assert_eq!(level_of(255).level, 2);
        assert_eq!(level_of(475).level, 3);
    }

    #[test]
    fn progress_within_level() {
        let progress = level_of(300);
        assert_eq!(progress.level, 2);
        assert_eq!(progress.xp_at_level_start, 255);
        assert_eq!(progress.xp_for_next_level, 220);
        assert_eq!(progress.xp_in_level(300), 45);
    }

    #[test]
    fn level_never_decreases_as_xp_grows() {
        let mut previous = 0;
        for xp in (0..20_000).step_by(37) {
            let level = level_of(xp).level;
            assert!(level >= previous, "level dropped at {xp} XP");
            previous = level;
        }
    }

    #[test]
    fn huge_totals_do_not_overflow() {
        let progress = level_of(u64::MAX);
        assert!(progress.level > 0);
        assert!(progress.xp_at_level_start <= u64::MAX);
    }
}

pub mod account;
pub mod budget;
pub mod hrm;
pub mod lead;
pub mod performance;
pub mod permission;
pub mod role;
pub mod training;

use strum::IntoEnumIterator;

/// A status column whose values move along a fixed set of edges.
pub trait Workflow: Copy + PartialEq + AsRef<str> + IntoEnumIterator + 'static {
    fn allowed_next(self) -> &'static [Self];

    fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next().contains(&next)
    }

    /// Every status from which `target` is reachable in one step.
    fn predecessors(target: Self) -> Vec<Self> {
        Self::iter().filter(|s| s.can_transition_to(target)).collect()
    }
}

/// Rounds a monetary amount to cents.
pub fn round_money(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_rounds_half_away_from_zero() {
        assert_eq!(round_money(10.005_1), 10.01);
        assert_eq!(round_money(3.333_3), 3.33);
        assert_eq!(round_money(-1.236), -1.24);
    }
}

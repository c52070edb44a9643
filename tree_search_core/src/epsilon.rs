//! Exploration schedules for [`FlatTree::train`](crate::mcts::flat::FlatTree::train).

pub trait EpsilonScheduler {
    /// Epsilon for the next training call.
    fn next_epsilon(&mut self) -> f64;
    fn name(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedEpsilon(pub f64);

impl EpsilonScheduler for FixedEpsilon {
    fn next_epsilon(&mut self) -> f64 {
        self.0
    }

    fn name(&self) -> String {
        format!("fixed epsilon {}", self.0)
    }
}

/// Starts fully random and steps down linearly until it hits the floor.
#[derive(Debug, Clone, PartialEq)]
pub struct DecayingEpsilon {
    current: f64,
    step: f64,
    floor: f64,
}

impl Default for DecayingEpsilon {
    fn default() -> Self {
        Self {
            current: 1.0,
            step: 0.05,
            floor: 0.05,
        }
    }
}

impl DecayingEpsilon {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EpsilonScheduler for DecayingEpsilon {
    fn next_epsilon(&mut self) -> f64 {
        let epsilon = self.current;
        self.current = (self.current - self.step).max(self.floor);
        epsilon
    }

    fn name(&self) -> String {
        format!("decaying epsilon (step {}, floor {})", self.step, self.floor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_epsilon() {
        let mut scheduler = FixedEpsilon(0.2);
        assert_eq!(scheduler.next_epsilon(), 0.2);
        assert_eq!(scheduler.next_epsilon(), 0.2);
        assert_eq!(scheduler.name(), "fixed epsilon 0.2");
    }

    #[test]
    fn test_decaying_epsilon_reaches_floor() {
        let mut scheduler = DecayingEpsilon::new();
        let values: Vec<f64> = (0..30).map(|_| scheduler.next_epsilon()).collect();

        assert_eq!(values[0], 1.0);
        assert!((values[1] - 0.95).abs() < 1e-9);
        assert!(values.windows(2).all(|pair| pair[1] <= pair[0]));
        assert!(values.iter().all(|&eps| eps >= 0.05));
        assert_eq!(values[29], 0.05);
    }

    #[test]
    fn test_schedulers_behind_trait_object() {
        let mut schedulers: Vec<Box<dyn EpsilonScheduler>> =
            vec![Box::new(FixedEpsilon(0.5)), Box::new(DecayingEpsilon::new())];
        let first: Vec<f64> = schedulers.iter_mut().map(|s| s.next_epsilon()).collect();
        assert_eq!(first, vec![0.5, 1.0]);
        assert!(schedulers[1].name().starts_with("decaying"));
    }
}

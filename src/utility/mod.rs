//! Occupancy States and Expected Utility
//!
//! The classifier outputs `P(state | sensor readings)` over the three
//! occupancy states. This module assigns each state a comfort/saving
//! utility from the current indoor and outdoor temperatures and combines
//! the two into an expected utility, the scalar benefit the planner
//! maximizes per unit of heating power.

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// Occupancy state of a slot, in network output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OccupancyState {
    /// Nobody home; saving energy dominates
    Away,
    /// Active presence; comfort dominates
    Home,
    /// Night; moderate comfort, strong penalty for overheating
    Sleep,
}

impl OccupancyState {
    pub const COUNT: usize = 3;

    pub const ALL: [OccupancyState; Self::COUNT] =
        [OccupancyState::Away, OccupancyState::Home, OccupancyState::Sleep];

    /// Index of this state in the network's output distribution.
    pub fn index(self) -> usize {
        match self {
            OccupancyState::Away => 0,
            OccupancyState::Home => 1,
            OccupancyState::Sleep => 2,
        }
    }

    /// Inverse of [`OccupancyState::index`], for dataset labels.
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(OccupancyState::Away),
            1 => Some(OccupancyState::Home),
            2 => Some(OccupancyState::Sleep),
            _ => None,
        }
    }
}

/// Utility of heating in the given state under the current temperatures.
///
/// Away penalizes keeping an empty home warm; Home rewards heating below
/// the comfort threshold, more so in cold weather; Sleep strongly
/// penalizes overheating and mildly rewards a minimum of warmth on cold
/// nights.
pub fn state_utility(state: OccupancyState, indoor_temp: f64, outdoor_temp: f64) -> f64 {
    match state {
        OccupancyState::Away => {
            if indoor_temp > 16.0 {
                -0.5
            } else {
                0.0
            }
        }
        OccupancyState::Home => {
            let mut u = if indoor_temp < 19.5 { 1.2 } else { 0.4 };
            if outdoor_temp < 8.0 && indoor_temp < 20.0 {
                u += 0.5;
            }
            u
        }
        OccupancyState::Sleep => {
            let mut u = if indoor_temp >= 19.5 { -2.5 } else { 0.2 };
            if outdoor_temp < 5.0 && indoor_temp < 17.0 {
                u += 0.3;
            }
            u
        }
    }
}

/// Expected utility of heating: `EU = sum over states of P(s) * U(s)`.
///
/// `probs` is the classifier's output distribution and must have one entry
/// per occupancy state.
pub fn expected_utility(probs: ArrayView1<f64>, indoor_temp: f64, outdoor_temp: f64) -> f64 {
    assert_eq!(
        probs.len(),
        OccupancyState::COUNT,
        "distribution length does not match the number of occupancy states"
    );

    OccupancyState::ALL
        .iter()
        .map(|&s| probs[s.index()] * state_utility(s, indoor_temp, outdoor_temp))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_state_indices_round_trip() {
        for state in OccupancyState::ALL {
            assert_eq!(OccupancyState::from_index(state.index()), Some(state));
        }
        assert_eq!(OccupancyState::from_index(3), None);
    }

    #[test]
    fn test_away_penalizes_warm_empty_home() {
        assert_relative_eq!(state_utility(OccupancyState::Away, 18.0, 6.0), -0.5);
        assert_relative_eq!(state_utility(OccupancyState::Away, 15.0, 6.0), 0.0);
        // Boundary: 16.0 is not "> 16.0"
        assert_relative_eq!(state_utility(OccupancyState::Away, 16.0, 6.0), 0.0);
    }

    #[test]
    fn test_home_comfort_with_cold_weather_bonus() {
        // Below comfort threshold, mild outside
        assert_relative_eq!(state_utility(OccupancyState::Home, 18.0, 10.0), 1.2);
        // Below comfort threshold, cold outside
        assert_relative_eq!(state_utility(OccupancyState::Home, 18.0, 6.0), 1.7, epsilon = 1e-12);
        // Warm enough already
        assert_relative_eq!(state_utility(OccupancyState::Home, 21.0, 10.0), 0.4);
        // Warm indoors blocks the cold-weather bonus
        assert_relative_eq!(state_utility(OccupancyState::Home, 21.0, 6.0), 0.4);
    }

    #[test]
    fn test_sleep_penalizes_overheating() {
        assert_relative_eq!(state_utility(OccupancyState::Sleep, 19.5, 10.0), -2.5);
        assert_relative_eq!(state_utility(OccupancyState::Sleep, 18.0, 10.0), 0.2);
        // Cold night bonus
        assert_relative_eq!(state_utility(OccupancyState::Sleep, 16.0, 4.0), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_expected_utility_weighs_by_probability() {
        let indoor = 18.0;
        let outdoor = 10.0;
        // U(Away) = -0.5, U(Home) = 1.2, U(Sleep) = 0.2 at these temperatures
        let probs = array![0.2, 0.5, 0.3];
        let eu = expected_utility(probs.view(), indoor, outdoor);
        assert_relative_eq!(eu, 0.2 * -0.5 + 0.5 * 1.2 + 0.3 * 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_expected_utility_of_certain_state() {
        let probs = array![1.0, 0.0, 0.0];
        assert_relative_eq!(expected_utility(probs.view(), 18.0, 6.0), -0.5);
    }

    #[test]
    #[should_panic(expected = "distribution length")]
    fn test_expected_utility_rejects_wrong_length() {
        let probs = array![0.5, 0.5];
        expected_utility(probs.view(), 18.0, 6.0);
    }
}

//! Heating Power Allocation
//!
//! Turns per-slot occupancy estimates and expected utilities into an
//! optimal power plan. The problem is a linear program:
//!
//! ```text
//! max  sum x_i * (occupancy_i * comfort_gain_i - price_i)
//! s.t. sum x_i * price_i <= budget
//!      sum x_i * risk_i  <= max_risk
//!      0 <= x_i <= 1
//! ```
//!
//! where `x_i` is the heating power level of slot `i`.

mod simplex;

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utility::OccupancyState;

/// Planner errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlannerError {
    #[error("budget must be a non-negative finite number, got {0}")]
    InvalidBudget(f64),
    #[error("risk limit must be a non-negative finite number, got {0}")]
    InvalidRiskLimit(f64),
    #[error("slot {index} contains a non-finite value")]
    NonFiniteSlot { index: usize },
    #[error("the allocation program is unbounded")]
    Unbounded,
}

/// One decision slot (apartment) as the planner sees it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Slot {
    /// Probability the slot is occupied (Home or Sleep)
    pub occupancy: f64,
    /// Energy price of running this slot at full power
    pub price: f64,
    /// Expected comfort utility per unit of heating power
    pub comfort_gain: f64,
    /// Risk charged against the global risk limit per unit of power
    pub risk: f64,
}

impl Slot {
    pub fn new(occupancy: f64, price: f64, comfort_gain: f64, risk: f64) -> Self {
        Self {
            occupancy,
            price,
            comfort_gain,
            risk,
        }
    }

    /// Build a slot from the classifier's output distribution: the risk of
    /// heating is the probability nobody is home, occupancy is the
    /// complementary presence mass.
    pub fn from_distribution(probs: ArrayView1<f64>, price: f64, comfort_gain: f64) -> Self {
        assert_eq!(
            probs.len(),
            OccupancyState::COUNT,
            "distribution length does not match the number of occupancy states"
        );

        Self {
            occupancy: probs[OccupancyState::Home.index()]
                + probs[OccupancyState::Sleep.index()],
            price,
            comfort_gain,
            risk: probs[OccupancyState::Away.index()],
        }
    }

    /// Net objective contribution of running this slot at full power.
    fn payoff(&self) -> f64 {
        self.occupancy * self.comfort_gain - self.price
    }

    fn is_finite(&self) -> bool {
        self.occupancy.is_finite()
            && self.price.is_finite()
            && self.comfort_gain.is_finite()
            && self.risk.is_finite()
    }
}

/// Global allocation limits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Maximum total energy cost
    pub budget: f64,
    /// Maximum total risk
    pub max_risk: f64,
}

impl PlannerConfig {
    pub fn new(budget: f64, max_risk: f64) -> Self {
        Self { budget, max_risk }
    }
}

/// The optimal plan: one power level in [0, 1] per slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatingPlan {
    pub power: Vec<f64>,
    /// Objective value achieved by the plan
    pub objective: f64,
}

/// Solve the allocation program for the given slots. Zero slots yield an
/// empty plan.
pub fn plan(slots: &[Slot], config: &PlannerConfig) -> Result<HeatingPlan, PlannerError> {
    if config.budget < 0.0 || !config.budget.is_finite() {
        return Err(PlannerError::InvalidBudget(config.budget));
    }
    if config.max_risk < 0.0 || !config.max_risk.is_finite() {
        return Err(PlannerError::InvalidRiskLimit(config.max_risk));
    }
    for (index, slot) in slots.iter().enumerate() {
        if !slot.is_finite() {
            return Err(PlannerError::NonFiniteSlot { index });
        }
    }

    if slots.is_empty() {
        return Ok(HeatingPlan {
            power: Vec::new(),
            objective: 0.0,
        });
    }

    let n = slots.len();
    let objective: Vec<f64> = slots.iter().map(Slot::payoff).collect();

    let mut constraints = Vec::with_capacity(n + 2);
    constraints.push((slots.iter().map(|s| s.price).collect(), config.budget));
    constraints.push((slots.iter().map(|s| s.risk).collect(), config.max_risk));
    for i in 0..n {
        let mut bound = vec![0.0; n];
        bound[i] = 1.0;
        constraints.push((bound, 1.0));
    }

    let (solution, objective_value) =
        simplex::maximize(&objective, &constraints).map_err(|_| PlannerError::Unbounded)?;

    Ok(HeatingPlan {
        power: solution.iter().map(|&x| x.clamp(0.0, 1.0)).collect(),
        objective: objective_value,
    })
}

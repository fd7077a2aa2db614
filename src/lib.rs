//! # Occupancy-Aware Heating Planner
//!
//! This library estimates apartment occupancy from sensor readings with a
//! small feed-forward neural network and turns the resulting probability
//! distribution into an optimal heating power plan.
//!
//! ## Modules
//!
//! - `nn` - Neural network core (activations, forward pass, backprop training)
//! - `data` - Dataset loading and feature scaling
//! - `utility` - Occupancy states and expected-utility evaluation
//! - `planner` - Linear-programming power allocation under budget and risk limits

pub mod data;
pub mod nn;
pub mod planner;
pub mod utility;

pub use data::{Dataset, FeatureScaler, OccupancyRecord, SlotReading};
pub use nn::{Network, NetworkConfig};
pub use planner::{HeatingPlan, PlannerConfig, Slot};
pub use utility::{expected_utility, OccupancyState};

//! Neural Network Core
//!
//! A single-hidden-layer feed-forward classifier trained by manual
//! backpropagation:
//! - ReLU hidden activation, softmax output
//! - Cross-entropy loss with stochastic gradient descent and L2 decay
//! - Explicit RNG for reproducible weight initialization

pub mod activation;
mod network;

use thiserror::Error;

pub use activation::{relu, relu_derivative, softmax_in_place};
pub use network::{cross_entropy, Network, NetworkConfig};

/// Errors raised by network construction and use
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    #[error("network dimensions must be positive (inputs={inputs}, hidden={hidden}, outputs={outputs})")]
    InvalidDimensions {
        inputs: usize,
        hidden: usize,
        outputs: usize,
    },
    #[error("learning rate must be a positive finite number, got {0}")]
    InvalidLearningRate(f64),
    #[error("L2 coefficient must be a non-negative finite number, got {0}")]
    InvalidL2(f64),
    #[error("input has length {got} but the network expects {expected}")]
    InputSizeMismatch { expected: usize, got: usize },
    #[error("target has length {got} but the network expects {expected}")]
    TargetSizeMismatch { expected: usize, got: usize },
    #[error("expected {inputs} feature columns and {outputs} target columns, got {got_inputs} and {got_outputs}")]
    MatrixShapeMismatch {
        inputs: usize,
        outputs: usize,
        got_inputs: usize,
        got_outputs: usize,
    },
    #[error("feature matrix has {inputs} rows but target matrix has {targets}")]
    RowCountMismatch { inputs: usize, targets: usize },
}

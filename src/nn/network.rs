//! Feed-Forward Occupancy Classifier
//!
//! A single-hidden-layer network mapping a normalized sensor vector to a
//! probability distribution over occupancy states. Training is plain
//! stochastic gradient descent on softmax cross-entropy with optional L2
//! weight decay; the backward pass is written out by hand.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::activation::{relu, relu_derivative, softmax_in_place};
use super::NetworkError;

/// Probabilities are clamped away from zero before taking logs.
const LOSS_EPSILON: f64 = 1e-15;

/// Structural dimensions and hyperparameters, fixed at construction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Number of input features
    pub num_inputs: usize,
    /// Number of hidden units
    pub num_hidden: usize,
    /// Number of output classes
    pub num_outputs: usize,
    /// SGD step size (> 0)
    pub learning_rate: f64,
    /// L2 weight-decay coefficient (>= 0, 0 disables decay)
    pub l2: f64,
}

impl NetworkConfig {
    pub fn new(
        num_inputs: usize,
        num_hidden: usize,
        num_outputs: usize,
        learning_rate: f64,
        l2: f64,
    ) -> Self {
        Self {
            num_inputs,
            num_hidden,
            num_outputs,
            learning_rate,
            l2,
        }
    }

    fn validate(&self) -> Result<(), NetworkError> {
        if self.num_inputs == 0 || self.num_hidden == 0 || self.num_outputs == 0 {
            return Err(NetworkError::InvalidDimensions {
                inputs: self.num_inputs,
                hidden: self.num_hidden,
                outputs: self.num_outputs,
            });
        }
        if self.learning_rate <= 0.0 || !self.learning_rate.is_finite() {
            return Err(NetworkError::InvalidLearningRate(self.learning_rate));
        }
        if self.l2 < 0.0 || !self.l2.is_finite() {
            return Err(NetworkError::InvalidL2(self.l2));
        }
        Ok(())
    }
}

/// The classifier: weight matrices, bias vectors, and the activation cache.
///
/// Weights are mutated only by [`Network::train`]; the activation cache is
/// overwritten by every forward or train call and is valid only after the
/// most recent one.
#[derive(Debug, Clone)]
pub struct Network {
    config: NetworkConfig,

    /// Input-to-hidden weights, one row per hidden unit
    w_ih: Array2<f64>,
    /// Hidden-to-output weights, one row per output unit
    w_ho: Array2<f64>,
    bias_hidden: Array1<f64>,
    bias_output: Array1<f64>,

    // Activation cache
    hidden_pre: Array1<f64>,
    hidden: Array1<f64>,
    output: Array1<f64>,
}

impl Network {
    /// Create a network with weights drawn uniformly from [-0.5, 0.5] and
    /// zero biases, using the caller's RNG.
    pub fn new<R: Rng + ?Sized>(config: NetworkConfig, rng: &mut R) -> Result<Self, NetworkError> {
        config.validate()?;

        let dist = Uniform::new(-0.5, 0.5);
        let w_ih = Array2::random_using((config.num_hidden, config.num_inputs), dist, rng);
        let w_ho = Array2::random_using((config.num_outputs, config.num_hidden), dist, rng);

        Ok(Self {
            w_ih,
            w_ho,
            bias_hidden: Array1::zeros(config.num_hidden),
            bias_output: Array1::zeros(config.num_outputs),
            hidden_pre: Array1::zeros(config.num_hidden),
            hidden: Array1::zeros(config.num_hidden),
            output: Array1::zeros(config.num_outputs),
            config,
        })
    }

    /// Create a network from a fixed seed, for reproducible runs.
    pub fn seeded(config: NetworkConfig, seed: u64) -> Result<Self, NetworkError> {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::new(config, &mut rng)
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn weights_input_hidden(&self) -> ArrayView2<'_, f64> {
        self.w_ih.view()
    }

    pub fn weights_hidden_output(&self) -> ArrayView2<'_, f64> {
        self.w_ho.view()
    }

    pub fn bias_hidden(&self) -> ArrayView1<'_, f64> {
        self.bias_hidden.view()
    }

    pub fn bias_output(&self) -> ArrayView1<'_, f64> {
        self.bias_output.view()
    }

    /// Hidden pre-activations from the most recent forward pass.
    pub fn hidden_pre(&self) -> ArrayView1<'_, f64> {
        self.hidden_pre.view()
    }

    /// Hidden activations from the most recent forward pass.
    pub fn hidden(&self) -> ArrayView1<'_, f64> {
        self.hidden.view()
    }

    /// Output distribution from the most recent forward pass.
    pub fn output(&self) -> ArrayView1<'_, f64> {
        self.output.view()
    }

    /// Total number of trainable parameters.
    pub fn num_parameters(&self) -> usize {
        self.w_ih.len() + self.w_ho.len() + self.bias_hidden.len() + self.bias_output.len()
    }

    /// Forward pass: input -> hidden (ReLU) -> output (softmax).
    ///
    /// Refreshes the activation cache and returns a copy of the output
    /// distribution. Weights are never modified here.
    pub fn forward(&mut self, input: ArrayView1<f64>) -> Result<Array1<f64>, NetworkError> {
        if input.len() != self.config.num_inputs {
            return Err(NetworkError::InputSizeMismatch {
                expected: self.config.num_inputs,
                got: input.len(),
            });
        }

        self.forward_unchecked(input);
        Ok(self.output.clone())
    }

    fn forward_unchecked(&mut self, input: ArrayView1<f64>) {
        self.hidden_pre = self.w_ih.dot(&input) + &self.bias_hidden;
        self.hidden = self.hidden_pre.mapv(relu);

        let mut logits = self.w_ho.dot(&self.hidden) + &self.bias_output;
        softmax_in_place(&mut logits);
        self.output = logits;
    }

    /// One training step on a single (input, one-hot target) pair.
    ///
    /// Runs a forward pass, backpropagates the softmax cross-entropy
    /// gradient, and applies the SGD update with L2 decay on weights (biases
    /// are not decayed). Returns the step's cross-entropy loss.
    ///
    /// Validation happens before the forward pass and both gradients are
    /// materialized before the first weight write, so a failed call leaves
    /// every parameter exactly as it was.
    pub fn train(
        &mut self,
        input: ArrayView1<f64>,
        target: ArrayView1<f64>,
    ) -> Result<f64, NetworkError> {
        if input.len() != self.config.num_inputs {
            return Err(NetworkError::InputSizeMismatch {
                expected: self.config.num_inputs,
                got: input.len(),
            });
        }
        if target.len() != self.config.num_outputs {
            return Err(NetworkError::TargetSizeMismatch {
                expected: self.config.num_outputs,
                got: target.len(),
            });
        }

        self.forward_unchecked(input);
        let loss = cross_entropy(self.output.view(), target);

        // Combined softmax + cross-entropy derivative w.r.t. the logits
        let g_out = &self.output - &target;

        // Hidden gradient; must read w_ho before the update below touches it
        let g_hidden = &self.w_ho.t().dot(&g_out) * &self.hidden_pre.mapv(relu_derivative);

        let lr = self.config.learning_rate;
        let l2 = self.config.l2;

        // Hidden -> output
        let mut grad_ho = outer(g_out.view(), self.hidden.view());
        if l2 > 0.0 {
            grad_ho = grad_ho + &(&self.w_ho * l2);
        }
        self.w_ho = &self.w_ho - &(&grad_ho * lr);
        self.bias_output = &self.bias_output - &(&g_out * lr);

        // Input -> hidden
        let mut grad_ih = outer(g_hidden.view(), input);
        if l2 > 0.0 {
            grad_ih = grad_ih + &(&self.w_ih * l2);
        }
        self.w_ih = &self.w_ih - &(&grad_ih * lr);
        self.bias_hidden = &self.bias_hidden - &(&g_hidden * lr);

        Ok(loss)
    }

    /// Train over every row of the dataset for the given number of epochs,
    /// one sample at a time in row order. Returns the mean loss per epoch.
    pub fn fit(
        &mut self,
        inputs: &Array2<f64>,
        targets: &Array2<f64>,
        epochs: usize,
    ) -> Result<Vec<f64>, NetworkError> {
        if inputs.ncols() != self.config.num_inputs || targets.ncols() != self.config.num_outputs {
            return Err(NetworkError::MatrixShapeMismatch {
                inputs: self.config.num_inputs,
                outputs: self.config.num_outputs,
                got_inputs: inputs.ncols(),
                got_outputs: targets.ncols(),
            });
        }
        if inputs.nrows() != targets.nrows() {
            return Err(NetworkError::RowCountMismatch {
                inputs: inputs.nrows(),
                targets: targets.nrows(),
            });
        }

        let n = inputs.nrows();
        let mut losses = Vec::with_capacity(epochs);

        for _ in 0..epochs {
            let mut total = 0.0;
            for (x, t) in inputs.rows().into_iter().zip(targets.rows()) {
                total += self.train(x, t)?;
            }
            losses.push(if n > 0 { total / n as f64 } else { 0.0 });
        }

        Ok(losses)
    }
}

/// Cross-entropy of a predicted distribution against a one-hot target.
pub fn cross_entropy(probs: ArrayView1<f64>, target: ArrayView1<f64>) -> f64 {
    -probs
        .iter()
        .zip(target.iter())
        .map(|(&p, &t)| t * p.clamp(LOSS_EPSILON, 1.0).ln())
        .sum::<f64>()
}

/// Outer product of a column and a row vector.
fn outer(col: ArrayView1<f64>, row: ArrayView1<f64>) -> Array2<f64> {
    let col = col.insert_axis(Axis(1));
    let row = row.insert_axis(Axis(0));
    col.dot(&row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn small_config(learning_rate: f64, l2: f64) -> NetworkConfig {
        NetworkConfig::new(2, 2, 2, learning_rate, l2)
    }

    /// Network with the fixed weights from the worked scenario.
    fn fixed_network(learning_rate: f64, l2: f64) -> Network {
        let mut net = Network::seeded(small_config(learning_rate, l2), 0).unwrap();
        net.w_ih = array![[0.1, 0.2], [0.3, 0.4]];
        net.w_ho = array![[0.5, 0.5], [0.5, 0.5]];
        net.bias_hidden = Array1::zeros(2);
        net.bias_output = Array1::zeros(2);
        net
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut rng = StdRng::seed_from_u64(1);

        let zero_dim = NetworkConfig::new(0, 4, 3, 0.01, 0.0);
        assert!(matches!(
            Network::new(zero_dim, &mut rng),
            Err(NetworkError::InvalidDimensions { .. })
        ));

        let bad_lr = NetworkConfig::new(2, 4, 3, 0.0, 0.0);
        assert!(matches!(
            Network::new(bad_lr, &mut rng),
            Err(NetworkError::InvalidLearningRate(_))
        ));

        let bad_l2 = NetworkConfig::new(2, 4, 3, 0.01, -0.1);
        assert!(matches!(
            Network::new(bad_l2, &mut rng),
            Err(NetworkError::InvalidL2(_))
        ));
    }

    #[test]
    fn test_initialization_range_and_zero_biases() {
        let net = Network::seeded(NetworkConfig::new(7, 16, 3, 0.01, 0.001), 42).unwrap();

        assert!(net.w_ih.iter().chain(net.w_ho.iter()).all(|&w| (-0.5..0.5).contains(&w)));
        assert!(net.bias_hidden.iter().all(|&b| b == 0.0));
        assert!(net.bias_output.iter().all(|&b| b == 0.0));
        assert_eq!(net.num_parameters(), 7 * 16 + 16 * 3 + 16 + 3);
    }

    #[test]
    fn test_forward_known_values() {
        let mut net = fixed_network(0.1, 0.0);
        let out = net.forward(array![1.0, 1.0].view()).unwrap();

        assert_relative_eq!(net.hidden_pre()[0], 0.3, epsilon = 1e-12);
        assert_relative_eq!(net.hidden_pre()[1], 0.7, epsilon = 1e-12);
        // Both pre-activations positive, so ReLU is the identity here
        assert_relative_eq!(net.hidden()[0], 0.3, epsilon = 1e-12);
        assert_relative_eq!(net.hidden()[1], 0.7, epsilon = 1e-12);
        // Equal logits of 0.5 each
        assert_relative_eq!(out[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(out[1], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_forward_is_deterministic_and_pure() {
        let mut net = Network::seeded(NetworkConfig::new(3, 5, 4, 0.01, 0.0), 9).unwrap();
        let input = array![0.25, -1.5, 0.75];
        let w_ih_before = net.w_ih.clone();
        let w_ho_before = net.w_ho.clone();

        let a = net.forward(input.view()).unwrap();
        let b = net.forward(input.view()).unwrap();

        assert_eq!(a, b);
        assert_eq!(net.w_ih, w_ih_before);
        assert_eq!(net.w_ho, w_ho_before);
        assert_relative_eq!(a.sum(), 1.0, epsilon = 1e-9);
        assert!(a.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn test_forward_rejects_wrong_input_length() {
        let mut net = Network::seeded(small_config(0.1, 0.0), 3).unwrap();
        let err = net.forward(array![1.0, 2.0, 3.0].view()).unwrap_err();
        assert_eq!(err, NetworkError::InputSizeMismatch { expected: 2, got: 3 });
    }

    #[test]
    fn test_gradients_match_finite_difference() {
        let lr = 0.5;
        let input = array![0.8, -0.3];
        let target = array![1.0, 0.0];

        let net = fixed_network(lr, 0.0);

        let loss_with = |net: &Network, perturb: &dyn Fn(&mut Network)| -> f64 {
            let mut probe = net.clone();
            perturb(&mut probe);
            let probs = probe.forward(input.view()).unwrap();
            cross_entropy(probs.view(), target.view())
        };

        // Analytic gradients recovered from one SGD step with l2 = 0
        let mut trained = net.clone();
        trained.train(input.view(), target.view()).unwrap();
        let g_w_ih = (&net.w_ih - &trained.w_ih) / lr;
        let g_w_ho = (&net.w_ho - &trained.w_ho) / lr;
        let g_b_h = (&net.bias_hidden - &trained.bias_hidden) / lr;
        let g_b_o = (&net.bias_output - &trained.bias_output) / lr;

        let eps = 1e-6;
        for r in 0..2 {
            for c in 0..2 {
                let plus = loss_with(&net, &|n: &mut Network| n.w_ih[[r, c]] += eps);
                let minus = loss_with(&net, &|n: &mut Network| n.w_ih[[r, c]] -= eps);
                assert_relative_eq!(g_w_ih[[r, c]], (plus - minus) / (2.0 * eps), epsilon = 1e-4);

                let plus = loss_with(&net, &|n: &mut Network| n.w_ho[[r, c]] += eps);
                let minus = loss_with(&net, &|n: &mut Network| n.w_ho[[r, c]] -= eps);
                assert_relative_eq!(g_w_ho[[r, c]], (plus - minus) / (2.0 * eps), epsilon = 1e-4);
            }

            let plus = loss_with(&net, &|n: &mut Network| n.bias_hidden[r] += eps);
            let minus = loss_with(&net, &|n: &mut Network| n.bias_hidden[r] -= eps);
            assert_relative_eq!(g_b_h[r], (plus - minus) / (2.0 * eps), epsilon = 1e-4);

            let plus = loss_with(&net, &|n: &mut Network| n.bias_output[r] += eps);
            let minus = loss_with(&net, &|n: &mut Network| n.bias_output[r] -= eps);
            assert_relative_eq!(g_b_o[r], (plus - minus) / (2.0 * eps), epsilon = 1e-4);
        }
    }

    #[test]
    fn test_l2_zero_is_plain_gradient_descent() {
        let lr = 0.1;
        let input = array![1.0, 0.5];
        let target = array![0.0, 1.0];

        let net = fixed_network(lr, 0.0);

        // Recompute the update by hand from the forward cache
        let mut probe = net.clone();
        probe.forward(input.view()).unwrap();
        let g_out = &probe.output - &target;
        let g_hidden = &probe.w_ho.t().dot(&g_out) * &probe.hidden_pre.mapv(relu_derivative);

        let expected_w_ho = &net.w_ho - &(&outer(g_out.view(), probe.hidden.view()) * lr);
        let expected_w_ih = &net.w_ih - &(&outer(g_hidden.view(), input.view()) * lr);
        let expected_b_o = &net.bias_output - &(&g_out * lr);
        let expected_b_h = &net.bias_hidden - &(&g_hidden * lr);

        let mut trained = net.clone();
        trained.train(input.view(), target.view()).unwrap();

        for (a, e) in trained.w_ho.iter().zip(expected_w_ho.iter()) {
            assert_relative_eq!(*a, *e, epsilon = 1e-12);
        }
        for (a, e) in trained.w_ih.iter().zip(expected_w_ih.iter()) {
            assert_relative_eq!(*a, *e, epsilon = 1e-12);
        }
        for (a, e) in trained.bias_output.iter().zip(expected_b_o.iter()) {
            assert_relative_eq!(*a, *e, epsilon = 1e-12);
        }
        for (a, e) in trained.bias_hidden.iter().zip(expected_b_h.iter()) {
            assert_relative_eq!(*a, *e, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_l2_adds_exactly_the_decay_term() {
        let lr = 0.1;
        let l2 = 0.05;
        let input = array![1.0, 0.5];
        let target = array![0.0, 1.0];

        let mut plain = fixed_network(lr, 0.0);
        let mut decayed = fixed_network(lr, l2);
        let w_ho_before = plain.w_ho.clone();
        let w_ih_before = plain.w_ih.clone();

        plain.train(input.view(), target.view()).unwrap();
        decayed.train(input.view(), target.view()).unwrap();

        // Same forward pass, so the updates differ only by lr * l2 * w
        for ((a, b), w) in plain.w_ho.iter().zip(decayed.w_ho.iter()).zip(w_ho_before.iter()) {
            assert_relative_eq!(a - b, lr * l2 * w, epsilon = 1e-12);
        }
        for ((a, b), w) in plain.w_ih.iter().zip(decayed.w_ih.iter()).zip(w_ih_before.iter()) {
            assert_relative_eq!(a - b, lr * l2 * w, epsilon = 1e-12);
        }
        // Biases are never decayed
        assert_eq!(plain.bias_output, decayed.bias_output);
        assert_eq!(plain.bias_hidden, decayed.bias_hidden);
    }

    #[test]
    fn test_failed_train_leaves_parameters_untouched() {
        let mut net = Network::seeded(small_config(0.1, 0.001), 11).unwrap();
        let before = net.clone();

        let err = net
            .train(array![1.0, 1.0].view(), array![1.0, 0.0, 0.0].view())
            .unwrap_err();
        assert_eq!(err, NetworkError::TargetSizeMismatch { expected: 2, got: 3 });

        assert_eq!(net.w_ih, before.w_ih);
        assert_eq!(net.w_ho, before.w_ho);
        assert_eq!(net.bias_hidden, before.bias_hidden);
        assert_eq!(net.bias_output, before.bias_output);
    }

    #[test]
    fn test_training_reduces_loss() {
        let mut net = Network::seeded(small_config(0.1, 0.0), 7).unwrap();
        let input = array![1.0, 0.5];
        let target = array![1.0, 0.0];

        let mut losses = Vec::new();
        for _ in 0..50 {
            losses.push(net.train(input.view(), target.view()).unwrap());
        }

        assert!(losses[49] < losses[0]);
        for i in 5..50 {
            assert!(losses[i] < losses[i - 1], "loss stalled at step {}", i);
        }
    }

    #[test]
    fn test_fit_validates_shapes() {
        let mut net = Network::seeded(small_config(0.1, 0.0), 5).unwrap();

        let x = Array2::zeros((4, 3));
        let y = Array2::zeros((4, 2));
        assert!(matches!(
            net.fit(&x, &y, 1),
            Err(NetworkError::MatrixShapeMismatch { .. })
        ));

        let x = Array2::zeros((4, 2));
        let y = Array2::zeros((3, 2));
        assert!(matches!(
            net.fit(&x, &y, 1),
            Err(NetworkError::RowCountMismatch { .. })
        ));
    }

    #[test]
    fn test_fit_learns_a_separable_pair() {
        let mut net = fixed_network(0.1, 0.0);
        // Each input activates its own hidden unit
        net.w_ih = array![[0.6, -0.4], [-0.3, 0.5]];

        let x = array![[1.0, 0.0], [0.0, 1.0]];
        let y = array![[1.0, 0.0], [0.0, 1.0]];

        let losses = net.fit(&x, &y, 200).unwrap();
        assert_eq!(losses.len(), 200);
        assert!(losses[199] < losses[0]);

        let p0 = net.forward(x.row(0)).unwrap();
        let p1 = net.forward(x.row(1)).unwrap();
        assert!(p0[0] > 0.5);
        assert!(p1[1] > 0.5);
    }

    #[test]
    fn test_cross_entropy_known_value() {
        let probs = array![0.5, 0.5];
        let target = array![1.0, 0.0];
        assert_relative_eq!(
            cross_entropy(probs.view(), target.view()),
            std::f64::consts::LN_2,
            epsilon = 1e-12
        );
    }
}

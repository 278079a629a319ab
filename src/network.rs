use itertools::{izip, Itertools};
use log::{debug, trace};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::*;

/// Learning-rate, momentum and error-smoothing settings.
///
/// Each [`Network`] owns its copy; two networks constructed with different
/// settings never observe each other's values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hyperparameters {
    /// Learning rate η applied to every weight update.
    pub eta: f64,
    /// Momentum α: the fraction of the previous weight delta carried into
    /// the next update.
    pub alpha: f64,
    /// Decay control for [`Network::recent_average_error`]; higher values
    /// adapt more slowly and smooth more.
    pub smoothing_factor: f64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            eta: 0.15,
            alpha: 0.5,
            smoothing_factor: 100.0,
        }
    }
}

/// A fully-connected feedforward network trained by backpropagation with
/// momentum-accelerated stochastic gradient descent.
///
/// The topology is fixed at construction; only synapse weights change
/// afterwards, and only through [`Network::train`]. All operations are
/// synchronous and single-threaded; `&mut self` on the mutating calls is
/// the whole concurrency contract.
#[derive(Clone, Debug)]
pub struct Network {
    layers: Vec<Layer>,
    hyperparameters: Hyperparameters,
    error_rate: f64,
    recent_average_error: f64,
}

impl Network {
    /// Builds a network for the given topology, drawing every synapse
    /// weight independently from `rng`.
    ///
    /// Reproducibility is the caller's choice: pass a seeded RNG (or use
    /// [`Network::seeded`]) for identical weights on every run, or an
    /// entropy-seeded one for fresh weights.
    pub fn random(
        rng: &mut dyn RngCore,
        topology: &[LayerTopology],
        hyperparameters: Hyperparameters,
    ) -> Result<Self, NetworkError> {
        if topology.len() < 2 || topology.iter().any(|layer| layer.neurons == 0) {
            return Err(NetworkError::InvalidTopology {
                layers: topology.len(),
            });
        }

        let output = topology.len() - 1;
        let mut layers = Vec::with_capacity(topology.len());
        for (t, (layer, next)) in topology.iter().tuple_windows().enumerate() {
            // Synapses address every neuron of the next layer, its bias
            // included; the output layer has none to address.
            let n_synapses = next.neurons + usize::from(t + 1 < output);
            layers.push(Layer::random(rng, layer.neurons, n_synapses));
        }
        layers.push(Layer::output(topology[output].neurons));

        // A neuron's id doubles as the synapse index addressing it from the
        // previous layer, so every fan-out must cover the next layer exactly.
        for (layer, next) in layers.iter().tuple_windows() {
            for neuron in layer.neurons() {
                assert_eq!(neuron.synapses.len(), next.neurons().len());
            }
        }

        Ok(Self {
            layers,
            hyperparameters,
            error_rate: 0.0,
            recent_average_error: 0.0,
        })
    }

    /// [`Network::random`] over a `ChaCha8Rng` seeded with `seed`: the same
    /// seed, topology and hyperparameters always yield the same network.
    pub fn seeded(
        topology: &[LayerTopology],
        hyperparameters: Hyperparameters,
        seed: u64,
    ) -> Result<Self, NetworkError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Self::random(&mut rng, topology, hyperparameters)
    }

    /// Feeds one input vector forward through the network.
    ///
    /// `inputs` must match the input layer's declared width; on a mismatch
    /// the call fails with [`NetworkError::InputSizeMismatch`] and no neuron
    /// state changes. Read the result back with [`Network::outputs`].
    pub fn propagate(&mut self, inputs: &[f64]) -> Result<(), NetworkError> {
        let expected = self.layers[0].width();
        if inputs.len() != expected {
            return Err(NetworkError::InputSizeMismatch {
                expected,
                given: inputs.len(),
            });
        }

        trace!("propagating {} input value(s)", inputs.len());

        for (neuron, &input) in izip!(self.layers[0].non_bias_mut(), inputs) {
            neuron.value = input;
        }

        for t in 1..self.layers.len() {
            let (prev, rest) = self.layers.split_at_mut(t);
            let prev_layer = &prev[t - 1];

            for neuron in rest[0].non_bias_mut() {
                neuron.feed_forward(prev_layer);
            }
        }

        Ok(())
    }

    /// Runs one training step against the expected output values: error
    /// measurement, gradient backpropagation and weight update, as one
    /// atomic operation on the activations left by the last
    /// [`Network::propagate`] call.
    ///
    /// `targets` must match the output layer's width; on a mismatch the call
    /// fails with [`NetworkError::TargetSizeMismatch`] before anything has
    /// been touched, the error metrics included.
    pub fn train(&mut self, targets: &[f64]) -> Result<(), NetworkError> {
        let expected = self.output_layer().width();
        if targets.len() != expected {
            return Err(NetworkError::TargetSizeMismatch {
                expected,
                given: targets.len(),
            });
        }

        self.error_rate = self.root_mean_square_error(targets);

        let smoothing = self.hyperparameters.smoothing_factor;
        self.recent_average_error =
            (self.recent_average_error * smoothing + self.error_rate) / (smoothing + 1.0);

        debug!(
            "trained one step: error rate {:.6}, recent average {:.6}",
            self.error_rate, self.recent_average_error
        );

        for (neuron, &target) in izip!(self.output_layer_mut().non_bias_mut(), targets) {
            neuron.output_gradient(target);
        }

        // Hidden gradients, last hidden layer back to the first. The bias
        // neurons get a gradient too; only the update pass below reads it.
        for t in (1..self.layers.len() - 1).rev() {
            let (hidden, rest) = self.layers.split_at_mut(t + 1);
            let next_layer = &rest[0];

            for neuron in &mut hidden[t].neurons {
                neuron.hidden_gradient(next_layer);
            }
        }

        // Weight update, output layer back to the first hidden layer: each
        // neuron pulls on the previous layer's synapses that address it.
        let Hyperparameters { eta, alpha, .. } = self.hyperparameters;
        for t in (1..self.layers.len()).rev() {
            let (prev, rest) = self.layers.split_at_mut(t);
            let prev_layer = &mut prev[t - 1];

            for neuron in &rest[0].neurons {
                neuron.update_input_weights(prev_layer, eta, alpha);
            }
        }

        Ok(())
    }

    /// Copy of the output layer's activations, one per declared output
    /// neuron.
    pub fn outputs(&self) -> Vec<f64> {
        self.output_layer()
            .non_bias()
            .iter()
            .map(|neuron| neuron.value)
            .collect()
    }

    /// Root-mean-square output error measured by the most recent
    /// [`Network::train`] call.
    pub fn error_rate(&self) -> f64 {
        self.error_rate
    }

    /// Exponentially smoothed error rate across training steps; watch this
    /// to judge convergence.
    pub fn recent_average_error(&self) -> f64 {
        self.recent_average_error
    }

    /// Declared widths per layer, bias neurons excluded.
    pub fn topology(&self) -> Vec<usize> {
        self.layers.iter().map(Layer::width).collect()
    }

    /// The layers in input-to-output order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    fn root_mean_square_error(&self, targets: &[f64]) -> f64 {
        let output_layer = self.output_layer();
        let squared_sum: f64 = izip!(targets, output_layer.non_bias())
            .map(|(&target, neuron)| (target - neuron.value).powi(2))
            .sum();

        (squared_sum / output_layer.width() as f64).sqrt()
    }

    fn output_layer(&self) -> &Layer {
        &self.layers[self.layers.len() - 1]
    }

    fn output_layer_mut(&mut self) -> &mut Layer {
        let last = self.layers.len() - 1;
        &mut self.layers[last]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn topology(widths: &[usize]) -> Vec<LayerTopology> {
        widths
            .iter()
            .map(|&neurons| LayerTopology { neurons })
            .collect()
    }

    /// (weight, delta_weight) per synapse, per neuron, per layer.
    fn snapshot_synapses(network: &Network) -> Vec<Vec<Vec<(f64, f64)>>> {
        network
            .layers
            .iter()
            .map(|layer| {
                layer
                    .neurons
                    .iter()
                    .map(|neuron| {
                        neuron
                            .synapses
                            .iter()
                            .map(|s| (s.weight, s.delta_weight))
                            .collect()
                    })
                    .collect()
            })
            .collect()
    }

    fn snapshot_values(network: &Network) -> Vec<Vec<f64>> {
        network
            .layers
            .iter()
            .map(|layer| layer.neurons.iter().map(|n| n.value).collect())
            .collect()
    }

    #[test]
    fn random_matches_the_requested_topology() {
        let mut rng = ChaCha8Rng::from_seed(Default::default());
        let network = Network::random(
            &mut rng,
            &topology(&[3, 2, 1]),
            Hyperparameters::default(),
        )
        .unwrap();

        assert_eq!(network.topology(), vec![3, 2, 1]);
        assert_eq!(network.layers.len(), 3);

        // Bias neurons everywhere but the output layer.
        assert_eq!(network.layers[0].neurons.len(), 4);
        assert_eq!(network.layers[1].neurons.len(), 3);
        assert_eq!(network.layers[2].neurons.len(), 1);

        // Every fan-out covers the whole next layer; the output layer has
        // no synapses at all.
        for neuron in network.layers[0].neurons() {
            assert_eq!(neuron.synapses.len(), 3);
        }
        for neuron in network.layers[1].neurons() {
            assert_eq!(neuron.synapses.len(), 1);
        }
        for neuron in network.layers[2].neurons() {
            assert!(neuron.synapses.is_empty());
        }
    }

    #[test]
    fn random_rejects_short_and_zero_width_topologies() {
        let mut rng = ChaCha8Rng::from_seed(Default::default());
        let hp = Hyperparameters::default();

        assert_eq!(
            Network::random(&mut rng, &topology(&[3]), hp).unwrap_err(),
            NetworkError::InvalidTopology { layers: 1 },
        );
        assert_eq!(
            Network::random(&mut rng, &[], hp).unwrap_err(),
            NetworkError::InvalidTopology { layers: 0 },
        );
        assert_eq!(
            Network::random(&mut rng, &topology(&[2, 0, 1]), hp).unwrap_err(),
            NetworkError::InvalidTopology { layers: 3 },
        );
    }

    #[test]
    fn propagate_rejects_wrong_input_width_and_leaves_state_alone() {
        let mut network =
            Network::seeded(&topology(&[2, 2, 1]), Hyperparameters::default(), 0).unwrap();
        network.propagate(&[1.0, 0.0]).unwrap();
        let values_before = snapshot_values(&network);

        assert_eq!(
            network.propagate(&[1.0, 0.0, 0.5]).unwrap_err(),
            NetworkError::InputSizeMismatch {
                expected: 2,
                given: 3
            },
        );

        assert_eq!(snapshot_values(&network), values_before);
    }

    #[test]
    fn propagated_outputs_stay_inside_the_activation_range() {
        let hp = Hyperparameters {
            eta: 0.5,
            alpha: 0.1,
            smoothing_factor: 100.0,
        };
        let mut network = Network::seeded(&topology(&[2, 2, 1]), hp, 0).unwrap();

        network.propagate(&[1.0, 0.0]).unwrap();
        let outputs = network.outputs();

        assert_eq!(outputs.len(), 1);
        assert!(outputs[0] > -1.0 && outputs[0] < 1.0);
    }

    #[test]
    fn propagate_is_idempotent_for_the_same_input() {
        let mut network =
            Network::seeded(&topology(&[3, 4, 2]), Hyperparameters::default(), 42).unwrap();

        network.propagate(&[0.25, -0.5, 0.75]).unwrap();
        let first = network.outputs();
        network.propagate(&[0.25, -0.5, 0.75]).unwrap();
        let second = network.outputs();

        assert_relative_eq!(first.as_slice(), second.as_slice());
    }

    #[test]
    fn train_rejects_wrong_target_width_and_leaves_weights_alone() {
        let mut network =
            Network::seeded(&topology(&[2, 2, 2]), Hyperparameters::default(), 0).unwrap();
        network.propagate(&[0.5, 0.5]).unwrap();
        let synapses_before = snapshot_synapses(&network);

        assert_eq!(
            network.train(&[1.0]).unwrap_err(),
            NetworkError::TargetSizeMismatch {
                expected: 2,
                given: 1
            },
        );

        assert_eq!(snapshot_synapses(&network), synapses_before);
        assert_eq!(network.error_rate(), 0.0);
        assert_eq!(network.recent_average_error(), 0.0);
    }

    #[test]
    fn first_train_seeds_the_recent_average_from_zero() {
        let hp = Hyperparameters {
            smoothing_factor: 100.0,
            ..Hyperparameters::default()
        };
        let mut network = Network::seeded(&topology(&[2, 3, 1]), hp, 3).unwrap();

        network.propagate(&[0.9, -0.9]).unwrap();
        network.train(&[0.5]).unwrap();

        assert_relative_eq!(network.recent_average_error(), network.error_rate() / 101.0);
    }

    #[test]
    fn train_updates_every_weight_by_the_momentum_rule() {
        let mut network =
            Network::seeded(&topology(&[2, 2, 1]), Hyperparameters::default(), 7).unwrap();
        network.propagate(&[0.3, -0.6]).unwrap();

        // A first step so that delta weights are non-zero and the momentum
        // term actually participates in the step under test.
        network.train(&[0.5]).unwrap();
        network.propagate(&[0.3, -0.6]).unwrap();

        let values = snapshot_values(&network);
        let old = snapshot_synapses(&network);
        let target = 0.5;

        network.train(&[target]).unwrap();

        // Recompute the gradients from the captured pre-update state.
        let out = values[2][0];
        let output_gradient = (target - out) * (1.0 - out * out);

        let hidden_gradients: Vec<f64> = (0..3)
            .map(|i| {
                let dow = old[1][i][0].0 * output_gradient;
                dow * (1.0 - values[1][i] * values[1][i])
            })
            .collect();

        let Hyperparameters { eta, alpha, .. } = Hyperparameters::default();

        // Synapses of the hidden layer, all addressing the single output.
        for i in 0..3 {
            let (old_weight, old_delta) = old[1][i][0];
            let expected_delta = eta * values[1][i] * output_gradient + alpha * old_delta;
            let synapse = &network.layers[1].neurons[i].synapses[0];

            assert_relative_eq!(synapse.delta_weight, expected_delta);
            assert_relative_eq!(synapse.weight, old_weight + expected_delta);
        }

        // Synapses of the input layer, addressing each hidden neuron (the
        // hidden bias included).
        for i in 0..3 {
            for j in 0..3 {
                let (old_weight, old_delta) = old[0][i][j];
                let expected_delta = eta * values[0][i] * hidden_gradients[j] + alpha * old_delta;
                let synapse = &network.layers[0].neurons[i].synapses[j];

                assert_relative_eq!(synapse.delta_weight, expected_delta);
                assert_relative_eq!(synapse.weight, old_weight + expected_delta);
            }
        }
    }

    #[test]
    fn training_learns_xor() {
        let examples: [(&[f64], &[f64]); 4] = [
            (&[0.0, 0.0], &[0.0]),
            (&[0.0, 1.0], &[1.0]),
            (&[1.0, 0.0], &[1.0]),
            (&[1.0, 1.0], &[0.0]),
        ];

        // Weight initialization is stochastic and the odd seed lands in a
        // local minimum, so accept any one of a handful of seeds.
        let converged = (0..5).any(|seed| {
            let mut network =
                Network::seeded(&topology(&[2, 4, 1]), Hyperparameters::default(), seed).unwrap();

            let mut after_warmup = f64::MAX;
            for epoch in 0..25_000 {
                for (inputs, targets) in examples {
                    network.propagate(inputs).unwrap();
                    network.train(targets).unwrap();
                }
                if epoch == 500 {
                    after_warmup = network.recent_average_error();
                }
            }

            network.recent_average_error() < after_warmup
                && network.recent_average_error() < 0.1
        });

        assert!(converged, "no seed drove the recent average error below 0.1");
    }
}

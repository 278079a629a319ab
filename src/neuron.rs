use rand::RngCore;

use crate::*;

/// A single unit of a [`Layer`]: its activation, its error gradient and the
/// synapses fanning out to the next layer (none for output neurons).
///
/// `id` is the neuron's index within its layer and, at the same time, the
/// index into every predecessor neuron's synapse vector that targets it.
#[derive(Clone, Debug)]
pub struct Neuron {
    pub(crate) id: usize,
    pub(crate) value: f64,
    pub(crate) gradient: f64,
    pub(crate) synapses: Vec<Synapse>,
}

impl Neuron {
    /// Creates a neuron with `n_synapses` outbound connections, one per
    /// neuron of the next layer, weights drawn independently from `rng`.
    pub(crate) fn random(rng: &mut dyn RngCore, id: usize, n_synapses: usize) -> Self {
        Self {
            id,
            value: 0.0,
            gradient: 0.0,
            synapses: (0..n_synapses).map(|_| Synapse::random(rng)).collect(),
        }
    }

    /// The bias unit: a constant 1.0 activation with ordinary trainable
    /// synapses, so each next-layer neuron gets a per-connection offset.
    pub(crate) fn bias(rng: &mut dyn RngCore, id: usize, n_synapses: usize) -> Self {
        Self {
            value: 1.0,
            ..Self::random(rng, id, n_synapses)
        }
    }

    /// An output-layer neuron; nothing downstream, so no synapses.
    pub(crate) fn output(id: usize) -> Self {
        Self {
            id,
            value: 0.0,
            gradient: 0.0,
            synapses: Vec::new(),
        }
    }

    /// Current activation (or raw input value on the input layer).
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Error-gradient signal from the most recent training step.
    pub fn gradient(&self) -> f64 {
        self.gradient
    }

    /// Outbound synapses, ordered by target neuron id.
    pub fn synapses(&self) -> &[Synapse] {
        &self.synapses
    }

    /// Sums the previous layer's activations (bias neuron included) through
    /// the synapses addressing this neuron, then squashes the sum.
    pub(crate) fn feed_forward(&mut self, prev_layer: &Layer) {
        let sum: f64 = prev_layer
            .neurons
            .iter()
            .map(|prev| prev.value * prev.synapses[self.id].weight)
            .sum();

        self.value = activate(sum);
    }

    /// Sum of the downstream weighted gradients: this neuron's share of the
    /// next layer's error. The next layer's bias neuron contributes nothing,
    /// since no synapse feeds it forward.
    fn sum_dow(&self, next_layer: &Layer) -> f64 {
        next_layer
            .non_bias()
            .iter()
            .map(|next| self.synapses[next.id].weight * next.gradient)
            .sum()
    }

    pub(crate) fn output_gradient(&mut self, target: f64) {
        let delta = target - self.value;
        self.gradient = delta * activate_derivative(self.value);
    }

    pub(crate) fn hidden_gradient(&mut self, next_layer: &Layer) {
        let dow = self.sum_dow(next_layer);
        self.gradient = dow * activate_derivative(self.value);
    }

    /// Applies the momentum-accelerated update to every previous-layer
    /// synapse that targets this neuron, using the hyperparameters of the
    /// owning network.
    pub(crate) fn update_input_weights(&self, prev_layer: &mut Layer, eta: f64, alpha: f64) {
        for prev in &mut prev_layer.neurons {
            let synapse = &mut prev.synapses[self.id];
            let new_delta = eta * prev.value * self.gradient + alpha * synapse.delta_weight;

            synapse.weight += new_delta;
            synapse.delta_weight = new_delta;
        }
    }
}

use rand::RngCore;

use crate::*;

/// One rank of neurons, ordered by id. Input and hidden layers carry a
/// trailing bias neuron beyond their declared width; the output layer does
/// not.
#[derive(Clone, Debug)]
pub struct Layer {
    pub(crate) neurons: Vec<Neuron>,
    pub(crate) width: usize,
}

impl Layer {
    /// An input or hidden layer: `width` neurons plus the bias neuron, each
    /// fanning out `n_synapses` connections to the next layer.
    pub(crate) fn random(rng: &mut dyn RngCore, width: usize, n_synapses: usize) -> Self {
        let mut neurons: Vec<Neuron> = (0..width)
            .map(|id| Neuron::random(rng, id, n_synapses))
            .collect();
        neurons.push(Neuron::bias(rng, width, n_synapses));

        Self { neurons, width }
    }

    /// The output layer: no bias neuron, no outbound synapses.
    pub(crate) fn output(width: usize) -> Self {
        Self {
            neurons: (0..width).map(Neuron::output).collect(),
            width,
        }
    }

    /// All neurons, bias included.
    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    /// Declared width, bias neuron excluded.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The declared-width prefix, i.e. everything but the bias neuron.
    pub(crate) fn non_bias(&self) -> &[Neuron] {
        &self.neurons[..self.width]
    }

    pub(crate) fn non_bias_mut(&mut self) -> &mut [Neuron] {
        &mut self.neurons[..self.width]
    }
}

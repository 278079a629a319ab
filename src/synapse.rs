use rand::{Rng, RngCore};

/// A directed, weighted connection from one neuron to a specific neuron of
/// the next layer. `delta_weight` remembers the last applied update so the
/// next update can carry a momentum term.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Synapse {
    pub(crate) weight: f64,
    pub(crate) delta_weight: f64,
}

impl Synapse {
    /// A fresh synapse with a weight drawn from `[-1, 1]` and no update
    /// history.
    pub(crate) fn random(rng: &mut dyn RngCore) -> Self {
        Self {
            weight: rng.gen_range(-1.0..=1.0),
            delta_weight: 0.0,
        }
    }

    /// Current connection strength.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// The update applied by the most recent training step.
    pub fn delta_weight(&self) -> f64 {
        self.delta_weight
    }
}

/// Declared width of one layer, bias neuron excluded.
///
/// A network is described by a slice of these, input layer first; every
/// non-output layer is silently granted one extra bias neuron on top of
/// the declared width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerTopology {
    /// Number of neurons in the layer.
    pub neurons: usize,
}

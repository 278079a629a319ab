//! A minimal fully-connected feedforward neural network, trained by
//! backpropagation with momentum-accelerated stochastic gradient descent.
//!
//! The network is built once from a topology (neuron count per layer) and a
//! set of [`Hyperparameters`], then driven by the caller: feed an input
//! vector with [`Network::propagate`], read the result with
//! [`Network::outputs`], and supply the expected values to
//! [`Network::train`] for one gradient step. Every non-output layer carries
//! an extra bias neuron with a constant 1.0 activation, giving each
//! downstream neuron a trainable offset.
//!
//! Weight initialization is random; construct through [`Network::seeded`]
//! (or hand [`Network::random`] a seeded RNG) when runs must be
//! reproducible. Training progress is observable through
//! [`Network::recent_average_error`], and each step is logged at debug
//! level via the [`log`] facade.
//!
//! ```
//! use lib_backprop_network::{Hyperparameters, LayerTopology, Network};
//!
//! let topology = [
//!     LayerTopology { neurons: 2 },
//!     LayerTopology { neurons: 4 },
//!     LayerTopology { neurons: 1 },
//! ];
//! let mut network = Network::seeded(&topology, Hyperparameters::default(), 0)?;
//!
//! network.propagate(&[0.0, 1.0])?;
//! let guess = network.outputs();
//! assert_eq!(guess.len(), 1);
//!
//! network.train(&[1.0])?;
//! # Ok::<(), lib_backprop_network::NetworkError>(())
//! ```

pub use self::activation::*;
pub use self::error::*;
pub use self::layer::*;
pub use self::layer_topology::*;
pub use self::network::*;
pub use self::neuron::*;
pub use self::synapse::*;

mod activation;
mod error;
mod layer;
mod layer_topology;
mod network;
mod neuron;
mod synapse;

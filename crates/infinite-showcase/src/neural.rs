//! A small feed-forward network whose activations pulse on a timer.
//!
//! Nothing is learned: every pulse draws fresh activations and connection
//! weights in `[0, 1)` from a seeded generator. The layout is fixed so a
//! renderer can place neurons once.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use infinite_geometry::Vec3;

/// Neurons per layer, input to output.
pub const LAYER_SIZES: [u32; 4] = [3, 5, 4, 2];

/// Horizontal distance between layers.
pub const LAYER_SPACING: f64 = 3.0;

/// Vertical distance between neurons within a layer.
pub const NEURON_SPACING: f64 = 1.5;

/// One neuron's place in the network.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neuron {
    /// Layer index, 0 for the input layer.
    pub layer: u32,
    /// Index within the layer.
    pub index: u32,
    /// Position for drawing.
    pub position: Vec3,
}

/// A weighted edge between neurons of consecutive layers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// Index into the neuron list of the source neuron.
    pub from: usize,
    /// Index into the neuron list of the target neuron.
    pub to: usize,
    /// Weight in `[0, 1)`.
    pub weight: f64,
}

/// The network and its latest pulse.
#[derive(Debug, Clone)]
pub struct NeuralPulse {
    rng: StdRng,
    neurons: Vec<Neuron>,
    connections: Vec<Connection>,
    activations: Vec<f64>,
    pulses: u64,
}

impl NeuralPulse {
    /// Lay out the network of [`LAYER_SIZES`]. Activations start at zero and
    /// weights are drawn from `seed`.
    pub fn new(seed: u64) -> Self {
        let mut neurons = Vec::new();
        for (layer, count) in (0_u32..).zip(LAYER_SIZES) {
            let half = f64::from(count) / 2.0;
            for index in 0..count {
                neurons.push(Neuron {
                    layer,
                    index,
                    position: Vec3::new(
                        f64::from(layer).mul_add(LAYER_SPACING, -4.5),
                        (f64::from(index) - half) * NEURON_SPACING,
                        0.0,
                    ),
                });
            }
        }

        let connections = neurons
            .iter()
            .enumerate()
            .flat_map(|(from, a)| {
                neurons
                    .iter()
                    .enumerate()
                    .filter(move |(_, b)| Some(b.layer) == a.layer.checked_add(1))
                    .map(move |(to, _)| Connection {
                        from,
                        to,
                        weight: 0.0,
                    })
            })
            .collect();

        let activations = vec![0.0; neurons.len()];
        let mut pulse = Self {
            rng: StdRng::seed_from_u64(seed),
            neurons,
            connections,
            activations,
            pulses: 0,
        };
        pulse.redraw_weights();
        pulse
    }

    fn redraw_weights(&mut self) {
        for connection in &mut self.connections {
            connection.weight = self.rng.random::<f64>();
        }
    }

    /// Draw fresh activations and weights.
    pub fn pulse(&mut self) {
        for activation in &mut self.activations {
            *activation = self.rng.random::<f64>();
        }
        self.redraw_weights();
        self.pulses = self.pulses.saturating_add(1);
    }

    /// Neurons in layer order.
    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    /// Connections between consecutive layers.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Activation per neuron, parallel to [`neurons`](Self::neurons).
    pub fn activations(&self) -> &[f64] {
        &self.activations
    }

    /// Activations of one layer.
    pub fn layer_activations(&self, layer: u32) -> Vec<f64> {
        self.neurons
            .iter()
            .zip(&self.activations)
            .filter(|(n, _)| n.layer == layer)
            .map(|(_, a)| *a)
            .collect()
    }

    /// Pulses so far.
    pub const fn pulses(&self) -> u64 {
        self.pulses
    }
}

//! Network structure, inference, and the binary model format.

use rand::Rng;

use crate::{ModelError, genetic};

/// Spread of the uniform distribution used for fresh layer parameters.
pub const INITIAL_WEIGHT_SPREAD: f32 = 2.0;

/// Per-layer activation kind.
///
/// The wire code is part of the persisted model format and must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Identity,
    Sigmoid,
    Relu,
}

impl Activation {
    /// Wire code written into the model header.
    #[must_use]
    pub fn code(self) -> f32 {
        match self {
            Activation::Identity => 0.0,
            Activation::Sigmoid => 1.0,
            Activation::Relu => 2.0,
        }
    }

    /// Inverse of [`Activation::code`].
    #[must_use]
    pub fn from_code(code: f32) -> Option<Self> {
        if code == 0.0 {
            Some(Activation::Identity)
        } else if code == 1.0 {
            Some(Activation::Sigmoid)
        } else if code == 2.0 {
            Some(Activation::Relu)
        } else {
            None
        }
    }

    /// Applies the activation element-wise.
    pub fn apply(self, values: &mut [f32]) {
        match self {
            Activation::Identity => {}
            Activation::Sigmoid => {
                for v in values {
                    *v = 1.0 / (1.0 + (-*v).exp());
                }
            }
            Activation::Relu => {
                for v in values {
                    *v = v.max(0.0);
                }
            }
        }
    }
}

/// One fully connected layer: a row-major `output_count` x `input_count`
/// weight matrix, one bias per output, and an activation kind.
///
/// The shape is fixed at construction; only the parameter values change
/// afterwards (through [`Network::set_weights`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    input_count: usize,
    output_count: usize,
    activation: Activation,
    weights: Vec<f32>,
    biases: Vec<f32>,
}

impl Layer {
    /// Creates a layer from explicit parameters.
    ///
    /// `weights` must hold exactly `input_count * output_count` values and
    /// `biases` exactly `output_count`.
    pub fn new(
        input_count: usize,
        output_count: usize,
        activation: Activation,
        weights: Vec<f32>,
        biases: Vec<f32>,
    ) -> Result<Self, ModelError> {
        if weights.len() != input_count * output_count {
            return Err(ModelError::ShapeMismatch {
                expected: input_count * output_count,
                actual: weights.len(),
            });
        }
        if biases.len() != output_count {
            return Err(ModelError::ShapeMismatch {
                expected: output_count,
                actual: biases.len(),
            });
        }
        Ok(Self {
            input_count,
            output_count,
            activation,
            weights,
            biases,
        })
    }

    /// Creates a layer with uniformly random parameters in
    /// ±[`INITIAL_WEIGHT_SPREAD`]`/2`.
    pub fn random<R>(
        input_count: usize,
        output_count: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Self
    where
        R: Rng + ?Sized,
    {
        Self {
            input_count,
            output_count,
            activation,
            weights: genetic::create_new(rng, input_count * output_count, INITIAL_WEIGHT_SPREAD),
            biases: genetic::create_new(rng, output_count, INITIAL_WEIGHT_SPREAD),
        }
    }

    fn zeroed(input_count: usize, output_count: usize, activation: Activation) -> Self {
        Self {
            input_count,
            output_count,
            activation,
            weights: vec![0.0; input_count * output_count],
            biases: vec![0.0; output_count],
        }
    }

    #[must_use]
    pub fn input_count(&self) -> usize {
        self.input_count
    }

    #[must_use]
    pub fn output_count(&self) -> usize {
        self.output_count
    }

    #[must_use]
    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// Total number of parameters (weights plus biases).
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }

    /// `result[i] = bias[i] + sum_j input[j] * weight[i * input_count + j]`,
    /// then the activation element-wise.
    fn forward(&self, inputs: &[f32]) -> Vec<f32> {
        debug_assert_eq!(inputs.len(), self.input_count);
        let mut result = Vec::with_capacity(self.output_count);
        for (row, bias) in self.weights.chunks_exact(self.input_count).zip(&self.biases) {
            let sum = row
                .iter()
                .zip(inputs)
                .fold(*bias, |acc, (w, x)| acc + w * x);
            result.push(sum);
        }
        self.activation.apply(&mut result);
        result
    }

    fn write_parameters(&self, out: &mut Vec<f32>) {
        out.extend_from_slice(&self.weights);
        out.extend_from_slice(&self.biases);
    }

    fn read_parameters(&mut self, parameters: &[f32]) {
        debug_assert_eq!(parameters.len(), self.parameter_count());
        let (weights, biases) = parameters.split_at(self.weights.len());
        self.weights.copy_from_slice(weights);
        self.biases.copy_from_slice(biases);
    }
}

/// An ordered stack of fully connected layers.
///
/// Adjacent layers must agree on width: `layer[i].output_count ==
/// layer[i + 1].input_count`. The network's declared input and output widths
/// are the first layer's input count and the last layer's output count.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    layers: Vec<Layer>,
    inputs: usize,
    outputs: usize,
}

impl Network {
    /// Assembles a network from layers, validating adjacent widths.
    pub fn new(layers: Vec<Layer>) -> Result<Self, ModelError> {
        let (Some(first), Some(last)) = (layers.first(), layers.last()) else {
            return Err(ModelError::MalformedBuffer {
                reason: "network has no layers",
            });
        };
        let (inputs, outputs) = (first.input_count, last.output_count);
        for pair in layers.windows(2) {
            if pair[0].output_count != pair[1].input_count {
                return Err(ModelError::ShapeMismatch {
                    expected: pair[0].output_count,
                    actual: pair[1].input_count,
                });
            }
        }
        Ok(Self {
            layers,
            inputs,
            outputs,
        })
    }

    /// Creates a fresh all-Relu network with random parameters.
    ///
    /// `layer_sizes` are the successive output widths chained after
    /// `input_count`; it must not be empty.
    pub fn random<R>(input_count: usize, layer_sizes: &[usize], rng: &mut R) -> Result<Self, ModelError>
    where
        R: Rng + ?Sized,
    {
        let mut layers = Vec::with_capacity(layer_sizes.len());
        let mut inputs = input_count;
        for &outputs in layer_sizes {
            layers.push(Layer::random(inputs, outputs, Activation::Relu, rng));
            inputs = outputs;
        }
        Self::new(layers)
    }

    #[must_use]
    pub fn inputs(&self) -> usize {
        self.inputs
    }

    #[must_use]
    pub fn outputs(&self) -> usize {
        self.outputs
    }

    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Total parameter count across all layers.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(Layer::parameter_count).sum()
    }

    /// Runs the input vector through every layer in order.
    pub fn predict(&self, input: &[f32]) -> Result<Vec<f32>, ModelError> {
        if input.len() != self.inputs {
            return Err(ModelError::ShapeMismatch {
                expected: self.inputs,
                actual: input.len(),
            });
        }
        let mut acc = input.to_vec();
        for layer in &self.layers {
            acc = layer.forward(&acc);
        }
        Ok(acc)
    }

    /// Flattens all layers' weights-then-biases into one vector, layer by
    /// layer. This is the vector the genetic operators work on.
    #[must_use]
    pub fn weights(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.parameter_count());
        for layer in &self.layers {
            layer.write_parameters(&mut out);
        }
        out
    }

    /// Restores all layers' parameters from one flattened vector.
    ///
    /// The vector must cover the network exactly.
    pub fn set_weights(&mut self, weights: &[f32]) -> Result<(), ModelError> {
        if weights.len() != self.parameter_count() {
            return Err(ModelError::LengthMismatch {
                expected: self.parameter_count(),
                actual: weights.len(),
            });
        }
        let mut offset = 0;
        for layer in &mut self.layers {
            let count = layer.parameter_count();
            layer.read_parameters(&weights[offset..offset + count]);
            offset += count;
        }
        Ok(())
    }

    /// Topology header: `[inputs, outputs, layer_count]` followed by
    /// `(input_count, activation_code, output_count)` per layer.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn topology(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(3 + 3 * self.layers.len());
        out.push(self.inputs as f32);
        out.push(self.outputs as f32);
        out.push(self.layers.len() as f32);
        for layer in &self.layers {
            out.push(layer.input_count as f32);
            out.push(layer.activation.code());
            out.push(layer.output_count as f32);
        }
        out
    }

    /// Serializes the network as a stream of little-endian 32-bit floats:
    /// the topology header, then the flattened parameter vector.
    ///
    /// The layout is bit-reproducible and self-describing; it is the
    /// persisted and transmitted model artifact.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut floats = self.topology();
        floats.extend(self.weights());
        let mut bytes = Vec::with_capacity(floats.len() * 4);
        for value in floats {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    /// Inverse of [`Network::to_bytes`]: reconstructs the layer shapes from
    /// the header, then consumes the parameter payload.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ModelError> {
        if bytes.len() % 4 != 0 {
            return Err(ModelError::MalformedBuffer {
                reason: "buffer length is not a multiple of 4",
            });
        }
        let floats: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        if floats.len() < 3 {
            return Err(ModelError::MalformedBuffer {
                reason: "buffer is shorter than the fixed header",
            });
        }

        let inputs = header_field(floats[0], "declared input width is not a valid count")?;
        let outputs = header_field(floats[1], "declared output width is not a valid count")?;
        let layer_count = header_field(floats[2], "declared layer count is not a valid count")?;

        let header_len = 3 + 3 * layer_count;
        if floats.len() < header_len {
            return Err(ModelError::MalformedBuffer {
                reason: "buffer ends inside the layer table",
            });
        }

        let mut layers = Vec::with_capacity(layer_count);
        for i in 0..layer_count {
            let at = 3 + 3 * i;
            let input_count = header_field(floats[at], "layer input width is not a valid count")?;
            let output_count =
                header_field(floats[at + 2], "layer output width is not a valid count")?;
            let Some(activation) = Activation::from_code(floats[at + 1]) else {
                return Err(ModelError::MalformedBuffer {
                    reason: "unknown activation code",
                });
            };
            layers.push(Layer::zeroed(input_count, output_count, activation));
        }

        let mut network = Self::new(layers).map_err(|_| ModelError::MalformedBuffer {
            reason: "layer table widths do not chain",
        })?;
        if network.inputs != inputs || network.outputs != outputs {
            return Err(ModelError::MalformedBuffer {
                reason: "declared widths disagree with the layer table",
            });
        }

        let payload = &floats[header_len..];
        if payload.len() != network.parameter_count() {
            return Err(ModelError::MalformedBuffer {
                reason: "payload length does not match the declared topology",
            });
        }
        network.set_weights(payload)?;
        Ok(network)
    }
}

/// Reads a non-negative integral count out of a header float.
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn header_field(value: f32, reason: &'static str) -> Result<usize, ModelError> {
    // f32 represents integers exactly up to 2^24, far beyond any real
    // topology dimension.
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= 16_777_216.0 {
        Ok(value as usize)
    } else {
        Err(ModelError::MalformedBuffer { reason })
    }
}

//! Feed-forward network engine and genetic variation operators.
//!
//! This crate holds the numeric core of the trainer: the network structure
//! and inference ([`network`]), its self-describing binary model format, and
//! the pure weight-vector operators evolution is built from ([`genetic`]).
//!
//! Trained models travel between processes as opaque byte buffers. The
//! buffer embeds the full topology ahead of the weights, so any consumer can
//! reconstruct the exact network shape from the buffer alone — no
//! side-channel metadata. See [`network::Network::to_bytes`] for the layout.
//!
//! Nothing in this crate owns a random source. Every randomized operation
//! takes `&mut R where R: rand::Rng + ?Sized`; runs are reproducible exactly
//! when the caller seeds the generator it threads through.

pub use self::network::{Activation, Layer, Network};

pub mod genetic;
pub mod network;

/// Errors of the network engine and the genetic operators.
///
/// All of these indicate a corrupted artifact or a broken caller contract,
/// never a transient fault; a training run must stop and report them.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ModelError {
    /// A vector or layer does not have the length its shape contract demands.
    #[display("shape mismatch: expected {expected} values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
    /// A flattened weight vector does not cover the network exactly.
    #[display("weight vector length mismatch: network holds {expected} parameters, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    /// A serialized model buffer is inconsistent with its own header.
    #[display("malformed model buffer: {reason}")]
    MalformedBuffer { reason: &'static str },
}

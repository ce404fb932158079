//! Generative transition models implemented with [candle](https://crates.io/crates/candle-core).
//!
//! * [`rbm::Rbm`] - Restricted Boltzmann machine trained with contrastive divergence
//! * [`vae::Vae`] - Variational autoencoder trained on the evidence lower bound
//!
//! Both implement [`GenerativeReplay`](genrep_core::GenerativeReplay), and
//! [`GenerativeModel`] selects one of them from configuration.
mod generative_model;
pub mod mlp;
pub mod model;
pub mod opt;
pub mod rbm;
pub mod util;
pub mod vae;
use anyhow::Result;
pub use generative_model::{GenerativeModel, GenerativeModelConfig};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// The main GPU device.
    Cuda(usize),
}

impl Default for Device {
    fn default() -> Self {
        Self::Cpu
    }
}

impl TryFrom<Device> for candle_core::Device {
    type Error = anyhow::Error;

    fn try_from(device: Device) -> Result<Self> {
        match device {
            Device::Cpu => Ok(candle_core::Device::Cpu),
            Device::Cuda(n) => Ok(candle_core::Device::new_cuda(n)?),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Copy)]
/// Activation functions.
pub enum Activation {
    /// No activation function.
    None,

    /// ReLU activation function.
    Relu,

    /// Leaky ReLU with the given negative slope.
    LeakyRelu(f64),

    /// Tanh activation function.
    Tanh,
}

impl Activation {
    /// Applies the activation function.
    pub fn forward(&self, xs: &candle_core::Tensor) -> Result<candle_core::Tensor> {
        Ok(match self {
            Self::None => xs.clone(),
            Self::Relu => xs.relu()?,
            Self::LeakyRelu(slope) => candle_nn::ops::leaky_relu(xs, *slope)?,
            Self::Tanh => xs.tanh()?,
        })
    }
}

//! Variational autoencoder.
mod base;
mod config;
pub use base::Vae;
pub use config::VaeConfig;

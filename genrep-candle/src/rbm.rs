//! Restricted Boltzmann machine.
mod base;
mod config;
pub use base::Rbm;
pub use config::RbmConfig;

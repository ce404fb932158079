//! Optimizers.
use anyhow::{anyhow, Context, Result};
use candle_core::{backprop::GradStore, DType, Device, Tensor, Var};
use candle_nn::VarMap;
use log::info;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::Path};

const STEP_KEY: &str = "step";

/// Configuration of optimizer for training generative models.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum OptimizerConfig {
    /// Adam optimizer.
    Adam {
        /// Learning rate.
        lr: f64,
        #[serde(default = "default_beta1")]
        /// Decay rate of the first moment.
        beta1: f64,
        #[serde(default = "default_beta2")]
        /// Decay rate of the second moment.
        beta2: f64,
        #[serde(default = "default_eps")]
        /// Term added to the denominator.
        eps: f64,
    },
}

fn default_beta1() -> f64 {
    0.9
}

fn default_beta2() -> f64 {
    0.999
}

fn default_eps() -> f64 {
    1e-8
}

impl OptimizerConfig {
    /// Constructs an optimizer over all variables in `varmap`.
    pub fn build(&self, varmap: &VarMap) -> Result<Optimizer> {
        match &self {
            OptimizerConfig::Adam {
                lr,
                beta1,
                beta2,
                eps,
            } => {
                let params = ParamsAdam {
                    lr: *lr,
                    beta1: *beta1,
                    beta2: *beta2,
                    eps: *eps,
                };
                Ok(Optimizer::Adam(Adam::new(varmap, params)?))
            }
        }
    }

    /// Override learning rate.
    pub fn learning_rate(self, lr: f64) -> Self {
        match self {
            Self::Adam {
                lr: _,
                beta1,
                beta2,
                eps,
            } => Self::Adam {
                lr,
                beta1,
                beta2,
                eps,
            },
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::Adam {
            lr: 0.01,
            beta1: default_beta1(),
            beta2: default_beta2(),
            eps: default_eps(),
        }
    }
}

/// Parameters of [`Adam`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamsAdam {
    /// Learning rate.
    pub lr: f64,

    /// Decay rate of the first moment.
    pub beta1: f64,

    /// Decay rate of the second moment.
    pub beta2: f64,

    /// Term added to the denominator.
    pub eps: f64,
}

struct AdamVar {
    name: String,
    var: Var,
    m: Var,
    v: Var,
}

/// Adam optimizer whose moment estimates can be saved and restored.
///
/// Variables are identified by their names in the [`VarMap`], so that the
/// state can be restored into an optimizer built over another instance of
/// the same model.
pub struct Adam {
    vars: Vec<AdamVar>,
    params: ParamsAdam,
    step: u32,
}

impl Adam {
    /// Constructs the optimizer with zero moment estimates.
    pub fn new(varmap: &VarMap, params: ParamsAdam) -> Result<Self> {
        let data = varmap
            .data()
            .lock()
            .map_err(|_| anyhow!("the variable map is poisoned"))?;
        let mut names: Vec<&String> = data.keys().collect();
        names.sort();

        let mut vars = vec![];
        for name in names.into_iter() {
            let var = data[name].clone();
            let m = Var::zeros(var.shape(), var.dtype(), var.device())?;
            let v = Var::zeros(var.shape(), var.dtype(), var.device())?;
            vars.push(AdamVar {
                name: name.clone(),
                var,
                m,
                v,
            });
        }

        Ok(Self {
            vars,
            params,
            step: 0,
        })
    }

    /// The number of steps taken so far.
    pub fn step_count(&self) -> u32 {
        self.step
    }

    /// Updates the variables with the given gradients.
    pub fn step(&mut self, grads: &GradStore) -> Result<()> {
        self.step += 1;
        let ParamsAdam {
            lr,
            beta1,
            beta2,
            eps,
        } = self.params;
        let scale_m = 1.0 / (1.0 - beta1.powi(self.step as i32));
        let scale_v = 1.0 / (1.0 - beta2.powi(self.step as i32));

        for AdamVar { var, m, v, .. } in self.vars.iter() {
            if let Some(g) = grads.get(var.as_tensor()) {
                let next_m = (m.as_tensor().affine(beta1, 0.)? + g.affine(1.0 - beta1, 0.)?)?;
                let next_v = (v.as_tensor().affine(beta2, 0.)? + g.sqr()?.affine(1.0 - beta2, 0.)?)?;
                let m_hat = next_m.affine(scale_m, 0.)?;
                let v_hat = next_v.affine(scale_v, 0.)?;
                let delta = (m_hat.affine(lr, 0.)? / v_hat.sqrt()?.affine(1.0, eps)?)?;
                var.set(&var.as_tensor().sub(&delta)?)?;
                m.set(&next_m)?;
                v.set(&next_v)?;
            }
        }
        Ok(())
    }

    /// Computes gradients of `loss` and updates the variables.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        let grads = loss.backward()?;
        self.step(&grads)
    }

    /// Saves the moment estimates and the step count.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        let mut tensors = HashMap::new();
        for AdamVar { name, m, v, .. } in self.vars.iter() {
            tensors.insert(format!("{}.m", name), m.as_tensor().clone());
            tensors.insert(format!("{}.v", name), v.as_tensor().clone());
        }
        tensors.insert(
            STEP_KEY.to_string(),
            Tensor::new(&[self.step], &Device::Cpu)?,
        );
        candle_core::safetensors::save(&tensors, path.as_ref())?;
        info!("Save optimizer state to {:?}", path.as_ref());
        Ok(())
    }

    /// Restores the moment estimates and the step count.
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        let tensors = candle_core::safetensors::load(path.as_ref(), &Device::Cpu)?;
        for AdamVar { name, m, v, .. } in self.vars.iter() {
            for (suffix, moment) in [("m", m), ("v", v)].iter() {
                let key = format!("{}.{}", name, suffix);
                let t = tensors
                    .get(&key)
                    .with_context(|| format!("{} not found in {:?}", key, path.as_ref()))?;
                let t = t.to_dtype(moment.dtype())?.to_device(moment.device())?;
                moment.set(&t)?;
            }
        }
        let step = tensors
            .get(STEP_KEY)
            .with_context(|| format!("{} not found in {:?}", STEP_KEY, path.as_ref()))?;
        self.step = step.to_dtype(DType::U32)?.to_vec1::<u32>()?[0];
        info!("Load optimizer state from {:?}", path.as_ref());
        Ok(())
    }
}

/// Optimizers.
pub enum Optimizer {
    /// Adam optimizer.
    Adam(Adam),
}

impl Optimizer {
    /// Applies a backward step pass.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        match self {
            Self::Adam(opt) => opt.backward_step(loss),
        }
    }

    /// Saves the optimizer state.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        match self {
            Self::Adam(opt) => opt.save(path),
        }
    }

    /// Loads the optimizer state.
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        match self {
            Self::Adam(opt) => opt.load(path),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use candle_nn::{Init, VarBuilder};
    use tempdir::TempDir;

    fn quadratic(varmap: &VarMap) -> Result<Tensor> {
        let vb = VarBuilder::from_varmap(varmap, DType::F32, &Device::Cpu);
        vb.get_with_hints(3, "x", Init::Const(1.0))
            .map_err(anyhow::Error::from)
    }

    #[test]
    fn test_adam_minimizes() -> Result<()> {
        let varmap = VarMap::new();
        let x = quadratic(&varmap)?;
        let mut opt = OptimizerConfig::default().learning_rate(0.1).build(&varmap)?;
        for _ in 0..200 {
            let loss = x.sqr()?.sum_all()?;
            opt.backward_step(&loss)?;
        }
        let loss = x.sqr()?.sum_all()?.to_scalar::<f32>()?;
        assert!(loss < 0.1, "{}", loss);
        Ok(())
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let dir = TempDir::new("adam")?;
        let path = dir.path().join("opt.safetensors");

        let varmap = VarMap::new();
        let x = quadratic(&varmap)?;
        let mut opt = OptimizerConfig::default().build(&varmap)?;
        for _ in 0..5 {
            opt.backward_step(&x.sqr()?.sum_all()?)?;
        }
        opt.save(&path)?;

        // Same trajectory after restoring the state into a fresh optimizer
        let varmap_ = VarMap::new();
        let x_ = quadratic(&varmap_)?;
        varmap_.data().lock().unwrap()["x"].set(&x)?;
        let mut opt_ = OptimizerConfig::default().build(&varmap_)?;
        opt_.load(&path)?;

        opt.backward_step(&x.sqr()?.sum_all()?)?;
        opt_.backward_step(&x_.sqr()?.sum_all()?)?;
        assert_eq!(x.to_vec1::<f32>()?, x_.to_vec1::<f32>()?);

        let Optimizer::Adam(adam) = &opt_;
        assert_eq!(adam.step_count(), 6);
        Ok(())
    }
}

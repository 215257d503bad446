//! SAM optimizer (Sharpness Aware Minimization).
//!
//! SAM seeks parameters that lie in neighborhoods having uniformly low loss,
//! improving model generalization. It requires two forward-backward passes per
//! step: one to compute the adversarial perturbation, and one to compute the
//! actual gradient at the perturbed point.
//!
//! Reference: Foret et al. "Sharpness-Aware Minimization for Efficiently
//! Improving Generalization" (ICLR 2021)
//!
//! Note: This is a wrapper optimizer. The wrapped base optimizer shares the
//! same parameter-group list (the two handles satisfy `Arc::ptr_eq`), so
//! hyperparameter changes made through either are visible to both. A full
//! update is driven through [`Optimizer::step_with`] with a closure that
//! re-runs the forward and backward pass:
//! 1. `first_step` perturbs every parameter with a gradient toward the local
//!    loss maximum and snapshots the original values;
//! 2. the closure recomputes gradients at the perturbed point;
//! 3. `second_step` restores the snapshots and lets the base optimizer apply
//!    the perturbed-point gradients at the original parameters.

use super::common::Optimizer;
use crate::group::SharedParamGroups;
use crate::{OptimError, OptimResult};
use scirs2_core::ndarray::{Array, Ix2};
use std::collections::HashMap;
use std::sync::Arc;

/// SAM optimizer wrapping a base optimizer.
#[derive(Debug)]
pub struct SamOptimizer<O: Optimizer> {
    /// Group list shared with the base optimizer.
    groups: SharedParamGroups,
    /// Base optimizer (e.g., SGD, Adam) that applies the real update.
    base_optimizer: O,
    /// Pre-perturbation snapshots, keyed by parameter name. Scratch state of
    /// one step cycle: written by `first_step`, consumed by `second_step`.
    old_values: HashMap<String, Array<f64, Ix2>>,
}

impl<O: Optimizer> SamOptimizer<O> {
    /// Create a new SAM optimizer around `base_optimizer`.
    ///
    /// The shared group list is taken from the base optimizer, so the aliasing
    /// invariant holds by construction. Fails if any group has a negative
    /// perturbation radius `rho`.
    pub fn new(base_optimizer: O) -> OptimResult<Self> {
        let groups = base_optimizer.param_groups();
        {
            let groups = groups.lock().unwrap();
            for group in groups.iter() {
                if group.config.rho < 0.0 {
                    return Err(OptimError::InvalidParameter(format!(
                        "rho must be non-negative, got {}",
                        group.config.rho
                    )));
                }
            }
        }
        Ok(Self {
            groups,
            base_optimizer,
            old_values: HashMap::new(),
        })
    }

    /// The wrapped base optimizer.
    pub fn base_optimizer(&self) -> &O {
        &self.base_optimizer
    }

    /// Perturb parameters toward the local loss maximum.
    ///
    /// Every parameter with a gradient is snapshotted and moved from `w` to
    /// `w + e(w)` where `e = (w² if adaptive else 1) · g · rho / (‖g‖ + ε)`.
    /// Parameters without a gradient are untouched.
    pub fn first_step(&mut self, zero_grad: bool) -> OptimResult<()> {
        let grad_norm = self.grad_norm();
        {
            let groups = self.groups.lock().unwrap();
            for group in groups.iter() {
                let scale = group.config.rho / (grad_norm + 1e-12);

                for handle in &group.params {
                    let mut param = handle.lock().unwrap();
                    let e_w = match param.grad() {
                        Some(grad) => {
                            if group.config.adaptive {
                                param.value().mapv(|w| w * w) * grad * scale
                            } else {
                                grad * scale
                            }
                        }
                        None => continue,
                    };
                    self.old_values
                        .insert(param.name().to_string(), param.value().clone());
                    *param.value_mut() += &e_w;
                }
            }
        }

        if zero_grad {
            self.zero_grad();
        }
        Ok(())
    }

    /// Restore the snapshotted parameters and apply the base optimizer's
    /// update using the current (perturbed-point) gradients.
    pub fn second_step(&mut self, zero_grad: bool) -> OptimResult<()> {
        {
            let groups = self.groups.lock().unwrap();
            for group in groups.iter() {
                for handle in &group.params {
                    let mut param = handle.lock().unwrap();
                    if param.grad().is_none() {
                        continue;
                    }
                    if let Some(old) = self.old_values.get(param.name()) {
                        param.value_mut().assign(old);
                    }
                }
            }
        }

        self.base_optimizer.step()?;

        if zero_grad {
            self.zero_grad();
        }
        Ok(())
    }

    /// Aggregate gradient norm across all groups.
    ///
    /// Each parameter with a gradient contributes the L2 norm of its gradient,
    /// scaled element-wise by |w| when the group is adaptive; the contributions
    /// are then combined by a second L2 norm. The two-level formulation keeps
    /// each parameter's contribution a single scalar.
    fn grad_norm(&self) -> f64 {
        let groups = self.groups.lock().unwrap();
        let mut norms = Vec::new();

        for group in groups.iter() {
            for handle in &group.params {
                let param = handle.lock().unwrap();
                if let Some(grad) = param.grad() {
                    let weighted = if group.config.adaptive {
                        param.value().mapv(f64::abs) * grad
                    } else {
                        grad.clone()
                    };
                    norms.push(weighted.mapv(|g| g * g).sum().sqrt());
                }
            }
        }

        norms.iter().map(|n| n * n).sum::<f64>().sqrt()
    }

    /// Shape of the named parameter, if it is managed by any group.
    fn param_dim(&self, name: &str) -> Option<Ix2> {
        let groups = self.groups.lock().unwrap();
        for group in groups.iter() {
            for handle in &group.params {
                let param = handle.lock().unwrap();
                if param.name() == name {
                    return Some(param.value().raw_dim());
                }
            }
        }
        None
    }
}

impl<O: Optimizer> Optimizer for SamOptimizer<O> {
    /// SAM has no single-evaluation step: without a second forward/backward
    /// pass at the perturbed point the update is undefined.
    fn step(&mut self) -> OptimResult<()> {
        Err(OptimError::OptimizerError(
            "SAM requires a closure that re-evaluates the loss; use step_with".to_string(),
        ))
    }

    fn step_with(&mut self, closure: &mut dyn FnMut() -> OptimResult<f64>) -> OptimResult<f64> {
        self.first_step(true)?;
        let loss = closure()?;
        self.second_step(false)?;
        Ok(loss)
    }

    fn zero_grad(&mut self) {
        self.base_optimizer.zero_grad();
    }

    fn get_lr(&self) -> f64 {
        self.base_optimizer.get_lr()
    }

    fn set_lr(&mut self, lr: f64) {
        self.base_optimizer.set_lr(lr);
    }

    fn param_groups(&self) -> SharedParamGroups {
        Arc::clone(&self.groups)
    }

    fn set_param_groups(&mut self, groups: SharedParamGroups) {
        self.groups = Arc::clone(&groups);
        self.base_optimizer.set_param_groups(groups);
    }

    fn state_dict(&self) -> HashMap<String, Vec<f64>> {
        let mut state = self.base_optimizer.state_dict();
        {
            let groups = self.groups.lock().unwrap();
            for (i, group) in groups.iter().enumerate() {
                state.insert(format!("group{}_rho", i), vec![group.config.rho]);
                state.insert(
                    format!("group{}_adaptive", i),
                    vec![if group.config.adaptive { 1.0 } else { 0.0 }],
                );
            }
        }
        for (name, old) in &self.old_values {
            state.insert(format!("old_value_{}", name), old.iter().copied().collect());
        }
        state
    }

    fn load_state_dict(&mut self, state: HashMap<String, Vec<f64>>) {
        {
            let mut groups = self.groups.lock().unwrap();
            for (i, group) in groups.iter_mut().enumerate() {
                if let Some(rho) = state.get(&format!("group{}_rho", i)) {
                    group.config.rho = rho[0];
                }
                if let Some(adaptive) = state.get(&format!("group{}_adaptive", i)) {
                    group.config.adaptive = adaptive[0] != 0.0;
                }
            }
        }

        self.base_optimizer.load_state_dict(state.clone());

        for (key, values) in state {
            if let Some(name) = key.strip_prefix("old_value_") {
                if let Some(shape) = self.param_dim(name) {
                    if let Ok(arr) = Array::from_shape_vec(shape, values) {
                        self.old_values.insert(name.to_string(), arr);
                    }
                }
            }
        }

        // the base optimizer must keep aliasing this group list after a reload
        self.base_optimizer.set_param_groups(Arc::clone(&self.groups));
    }
}

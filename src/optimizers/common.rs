//! Common optimizer utilities and traits.

use crate::group::{ParamGroup, SharedParamGroups};
use crate::OptimResult;
use scirs2_core::ndarray::{Array, Ix2};
use std::collections::HashMap;

/// Gradient clipping mode.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum GradClipMode {
    /// Clip by value (element-wise).
    Value,
    /// Clip by global L2 norm.
    Norm,
}

/// Hyperparameters for one parameter group.
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Learning rate.
    pub learning_rate: f64,
    /// Momentum (for SGD).
    pub momentum: f64,
    /// Beta1 (for Adam-family optimizers).
    pub beta1: f64,
    /// Beta2 (for Adam-family optimizers).
    pub beta2: f64,
    /// Epsilon for numerical stability.
    pub epsilon: f64,
    /// Weight decay (for AdamW/AdaBelief).
    pub weight_decay: f64,
    /// Perturbation radius (for SAM).
    pub rho: f64,
    /// Weight the SAM perturbation and norm by parameter magnitude.
    pub adaptive: bool,
    /// Gradient clipping threshold (None = no clipping).
    pub grad_clip: Option<f64>,
    /// Gradient clipping mode.
    pub grad_clip_mode: GradClipMode,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.001,
            momentum: 0.9,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            weight_decay: 0.01,
            rho: 0.05,
            adaptive: false,
            grad_clip: None,
            grad_clip_mode: GradClipMode::Value,
        }
    }
}

/// Trait for optimizers over shared parameter groups.
///
/// Implementations hold a [`SharedParamGroups`] handle and update the
/// parameters in place from their accumulated gradients. Parameters whose
/// gradient is absent are skipped.
pub trait Optimizer {
    /// Update parameters from their current gradients.
    fn step(&mut self) -> OptimResult<()>;

    /// Evaluate `closure` (a full forward/backward pass returning the loss),
    /// then update parameters.
    ///
    /// Wrapper optimizers that need more than one gradient evaluation per
    /// update override this; for plain optimizers the closure runs exactly
    /// once before the update.
    fn step_with(&mut self, closure: &mut dyn FnMut() -> OptimResult<f64>) -> OptimResult<f64> {
        let loss = closure()?;
        self.step()?;
        Ok(loss)
    }

    /// Drop the gradients of all managed parameters.
    fn zero_grad(&mut self);

    /// Get current learning rate (of the first group).
    fn get_lr(&self) -> f64;

    /// Set the learning rate of every group.
    fn set_lr(&mut self, lr: f64);

    /// Handle to the shared group list.
    fn param_groups(&self) -> SharedParamGroups;

    /// Re-point this optimizer at another group list.
    fn set_param_groups(&mut self, groups: SharedParamGroups);

    /// Get optimizer state for checkpointing.
    fn state_dict(&self) -> HashMap<String, Vec<f64>>;

    /// Load optimizer state from checkpoint.
    fn load_state_dict(&mut self, state: HashMap<String, Vec<f64>>);
}

/// Compute the global L2 norm of all gradients across all groups.
pub fn global_grad_norm(groups: &[ParamGroup]) -> f64 {
    let mut total_norm_sq = 0.0;

    for group in groups {
        for handle in &group.params {
            let param = handle.lock().unwrap();
            if let Some(grad) = param.grad() {
                for &g in grad.iter() {
                    total_norm_sq += g * g;
                }
            }
        }
    }

    total_norm_sq.sqrt()
}

/// Apply the group's clipping settings to one gradient.
///
/// `total_norm` is the precomputed global gradient norm, consulted only in
/// [`GradClipMode::Norm`] mode.
pub fn clip_gradient(grad: &mut Array<f64, Ix2>, config: &OptimizerConfig, total_norm: f64) {
    if let Some(clip_value) = config.grad_clip {
        match config.grad_clip_mode {
            GradClipMode::Value => {
                grad.mapv_inplace(|g| g.max(-clip_value).min(clip_value));
            }
            GradClipMode::Norm => {
                if total_norm > clip_value {
                    let scale = clip_value / total_norm;
                    grad.mapv_inplace(|g| g * scale);
                }
            }
        }
    }
}

/// Drop the gradient of every parameter in `groups`.
pub fn zero_grads(groups: &[ParamGroup]) {
    for group in groups {
        for handle in &group.params {
            handle.lock().unwrap().clear_grad();
        }
    }
}

/// Learning rate of the first group, or 0.0 for an empty group list.
pub fn first_group_lr(groups: &SharedParamGroups) -> f64 {
    let groups = groups.lock().unwrap();
    groups.first().map(|g| g.config.learning_rate).unwrap_or(0.0)
}

/// Set the learning rate of every group.
pub fn set_all_lrs(groups: &SharedParamGroups, lr: f64) {
    let mut groups = groups.lock().unwrap();
    for group in groups.iter_mut() {
        group.config.learning_rate = lr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::single_group;
    use crate::parameter::Parameter;
    use scirs2_core::ndarray::array;

    fn groups_with_grad(grad: Array<f64, Ix2>) -> SharedParamGroups {
        let mut param = Parameter::new("w", Array::zeros(grad.raw_dim()));
        param.set_grad(grad);
        single_group(vec![param.into_shared()], OptimizerConfig::default())
    }

    #[test]
    fn test_global_grad_norm() {
        let groups = groups_with_grad(array![[3.0, 4.0]]);
        let groups = groups.lock().unwrap();
        assert!((global_grad_norm(&groups) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_grad_norm_skips_missing_gradients() {
        let with_grad = {
            let mut p = Parameter::new("w", array![[0.0]]);
            p.set_grad(array![[2.0]]);
            p.into_shared()
        };
        let without_grad = Parameter::new("frozen", array![[7.0]]).into_shared();
        let groups = single_group(vec![with_grad, without_grad], OptimizerConfig::default());
        let groups = groups.lock().unwrap();
        assert_eq!(global_grad_norm(&groups), 2.0);
    }

    #[test]
    fn test_clip_by_value() {
        let config = OptimizerConfig {
            grad_clip: Some(0.5),
            grad_clip_mode: GradClipMode::Value,
            ..Default::default()
        };
        let mut grad = array![[-2.0, 0.25, 2.0]];
        clip_gradient(&mut grad, &config, 0.0);
        assert_eq!(grad, array![[-0.5, 0.25, 0.5]]);
    }

    #[test]
    fn test_clip_by_norm_rescales_globally() {
        let config = OptimizerConfig {
            grad_clip: Some(1.0),
            grad_clip_mode: GradClipMode::Norm,
            ..Default::default()
        };
        let mut grad = array![[3.0, 4.0]];
        clip_gradient(&mut grad, &config, 5.0);
        assert!((grad[[0, 0]] - 0.6).abs() < 1e-12);
        assert!((grad[[0, 1]] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_zero_grads() {
        let groups = groups_with_grad(array![[1.0]]);
        {
            let groups = groups.lock().unwrap();
            zero_grads(&groups);
        }
        let groups = groups.lock().unwrap();
        assert!(groups[0].params[0].lock().unwrap().grad().is_none());
    }
}

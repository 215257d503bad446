//! AdamW optimizer (Adam with decoupled weight decay).
//!
//! AdamW decouples weight decay from the gradient-based update: the decay is
//! applied directly to the parameters instead of being folded into the
//! gradient, which restores the original regularization semantics under
//! adaptive learning rates.
//!
//! Reference: Loshchilov & Hutter, "Decoupled Weight Decay Regularization", ICLR 2019

use super::common::{
    clip_gradient, first_group_lr, global_grad_norm, set_all_lrs, zero_grads, Optimizer,
};
use crate::group::SharedParamGroups;
use crate::OptimResult;
use scirs2_core::ndarray::{Array, Ix2};
use std::collections::HashMap;
use std::sync::Arc;

/// AdamW optimizer.
#[derive(Debug)]
pub struct AdamWOptimizer {
    groups: SharedParamGroups,
    /// First moment estimates (exponential moving average of gradients).
    m: HashMap<String, Array<f64, Ix2>>,
    /// Second moment estimates (exponential moving average of squared gradients).
    v: HashMap<String, Array<f64, Ix2>>,
    /// Timestep counter.
    t: usize,
}

impl AdamWOptimizer {
    /// Create a new AdamW optimizer over `groups`.
    pub fn new(groups: SharedParamGroups) -> Self {
        Self {
            groups,
            m: HashMap::new(),
            v: HashMap::new(),
            t: 0,
        }
    }
}

impl Optimizer for AdamWOptimizer {
    fn step(&mut self) -> OptimResult<()> {
        let groups = self.groups.lock().unwrap();
        let total_norm = global_grad_norm(&groups);
        self.t += 1;

        for group in groups.iter() {
            let lr = group.config.learning_rate;
            let beta1 = group.config.beta1;
            let beta2 = group.config.beta2;
            let eps = group.config.epsilon;
            let weight_decay = group.config.weight_decay;
            let bias_correction1 = 1.0 - beta1.powi(self.t as i32);
            let bias_correction2 = 1.0 - beta2.powi(self.t as i32);

            for handle in &group.params {
                let mut param = handle.lock().unwrap();
                let mut grad = match param.grad() {
                    Some(g) => g.clone(),
                    None => continue,
                };
                clip_gradient(&mut grad, &group.config, total_norm);

                if !self.m.contains_key(param.name()) {
                    self.m
                        .insert(param.name().to_string(), Array::zeros(grad.raw_dim()));
                    self.v
                        .insert(param.name().to_string(), Array::zeros(grad.raw_dim()));
                }
                let m = self.m.get_mut(param.name()).unwrap();
                let v = self.v.get_mut(param.name()).unwrap();

                *m = &*m * beta1 + &(&grad * (1.0 - beta1));
                let grad_squared = grad.mapv(|g| g * g);
                *v = &*v * beta2 + &(grad_squared * (1.0 - beta2));

                // decoupled decay acts on the parameter, not the gradient
                if weight_decay > 0.0 {
                    param.value_mut().mapv_inplace(|p| p * (1.0 - lr * weight_decay));
                }

                let m_hat = &*m / bias_correction1;
                let v_hat = &*v / bias_correction2;
                let update = m_hat / (v_hat.mapv(|val| val.sqrt()) + eps);
                let new_value = param.value() - &(update * lr);
                *param.value_mut() = new_value;
            }
        }

        Ok(())
    }

    fn zero_grad(&mut self) {
        let groups = self.groups.lock().unwrap();
        zero_grads(&groups);
    }

    fn get_lr(&self) -> f64 {
        first_group_lr(&self.groups)
    }

    fn set_lr(&mut self, lr: f64) {
        set_all_lrs(&self.groups, lr);
    }

    fn param_groups(&self) -> SharedParamGroups {
        Arc::clone(&self.groups)
    }

    fn set_param_groups(&mut self, groups: SharedParamGroups) {
        self.groups = groups;
    }

    fn state_dict(&self) -> HashMap<String, Vec<f64>> {
        let mut state = HashMap::new();
        state.insert("t".to_string(), vec![self.t as f64]);
        for (name, m_val) in &self.m {
            state.insert(format!("m_{}", name), m_val.iter().copied().collect());
        }
        for (name, v_val) in &self.v {
            state.insert(format!("v_{}", name), v_val.iter().copied().collect());
        }
        state
    }

    fn load_state_dict(&mut self, state: HashMap<String, Vec<f64>>) {
        if let Some(t_vals) = state.get("t") {
            self.t = t_vals[0] as usize;
        }
        for (key, values) in state {
            if let Some(name) = key.strip_prefix("m_") {
                if let Some(m) = self.m.get(name) {
                    let shape = m.raw_dim();
                    if let Ok(arr) = Array::from_shape_vec(shape, values) {
                        self.m.insert(name.to_string(), arr);
                    }
                }
            } else if let Some(name) = key.strip_prefix("v_") {
                if let Some(v) = self.v.get(name) {
                    let shape = v.raw_dim();
                    if let Ok(arr) = Array::from_shape_vec(shape, values) {
                        self.v.insert(name.to_string(), arr);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::common::OptimizerConfig;
    use super::*;
    use crate::group::single_group;
    use crate::parameter::Parameter;
    use scirs2_core::ndarray::array;

    #[test]
    fn test_adamw_step_decreases_parameters() {
        let mut param = Parameter::new("w", array![[1.0, 2.0]]);
        param.set_grad(array![[0.1, 0.2]]);
        let param = param.into_shared();
        let groups = single_group(
            vec![Arc::clone(&param)],
            OptimizerConfig {
                learning_rate: 0.001,
                weight_decay: 0.01,
                ..Default::default()
            },
        );
        let mut optimizer = AdamWOptimizer::new(groups);

        for _ in 0..5 {
            optimizer.step().unwrap();
        }

        let param = param.lock().unwrap();
        assert!(param.value()[[0, 0]] < 1.0);
        assert!(param.value()[[0, 1]] < 2.0);
    }

    #[test]
    fn test_weight_decay_shrinks_despite_zero_gradient() {
        // with an all-zero gradient the adaptive update vanishes but the
        // decoupled decay still pulls the parameter toward zero
        let mut param = Parameter::new("w", array![[2.0]]);
        param.set_grad(array![[0.0]]);
        let param = param.into_shared();
        let groups = single_group(
            vec![Arc::clone(&param)],
            OptimizerConfig {
                learning_rate: 0.1,
                weight_decay: 0.5,
                ..Default::default()
            },
        );
        let mut optimizer = AdamWOptimizer::new(groups);

        optimizer.step().unwrap();

        let value = param.lock().unwrap().value()[[0, 0]];
        assert!((value - 2.0 * (1.0 - 0.1 * 0.5)).abs() < 1e-12);
    }
}

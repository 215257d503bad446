//! AdaBelief optimizer (NeurIPS 2020).
//!
//! AdaBelief adapts the step size according to the "belief" in the gradient
//! direction. It uses the variance of gradients (belief) to adapt the learning
//! rate, which can achieve faster convergence and better generalization than
//! Adam/AdamW.
//!
//! Reference: Zhuang et al. "AdaBelief Optimizer: Adapting Stepsizes by the
//! Belief in Observed Gradients" (NeurIPS 2020)

use super::common::{
    clip_gradient, first_group_lr, global_grad_norm, set_all_lrs, zero_grads, Optimizer,
};
use crate::group::SharedParamGroups;
use crate::OptimResult;
use scirs2_core::ndarray::{Array, Ix2};
use std::collections::HashMap;
use std::sync::Arc;

/// AdaBelief optimizer.
#[derive(Debug)]
pub struct AdaBeliefOptimizer {
    groups: SharedParamGroups,
    /// First moment estimates (exponential moving average of gradients).
    m: HashMap<String, Array<f64, Ix2>>,
    /// Second moment estimates (variance of gradients).
    s: HashMap<String, Array<f64, Ix2>>,
    /// Timestep counter.
    t: usize,
}

impl AdaBeliefOptimizer {
    /// Create a new AdaBelief optimizer over `groups`.
    pub fn new(groups: SharedParamGroups) -> Self {
        Self {
            groups,
            m: HashMap::new(),
            s: HashMap::new(),
            t: 0,
        }
    }
}

impl Optimizer for AdaBeliefOptimizer {
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
                    self.s
                        .insert(param.name().to_string(), Array::zeros(grad.raw_dim()));
                }
                let m = self.m.get_mut(param.name()).unwrap();
                let s = self.s.get_mut(param.name()).unwrap();

                *m = &*m * beta1 + &(&grad * (1.0 - beta1));
                let grad_diff = &grad - &*m;
                let grad_diff_squared = grad_diff.mapv(|g| g * g);
                *s = &*s * beta2 + &(grad_diff_squared * (1.0 - beta2));

                let m_hat = &*m / bias_correction1;
                let s_hat = &*s / bias_correction2;
                if weight_decay > 0.0 {
                    param.value_mut().mapv_inplace(|p| p * (1.0 - lr * weight_decay));
                }
                let update = m_hat / (s_hat.mapv(|v| v.sqrt()) + eps);
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
        for (name, s_val) in &self.s {
            state.insert(format!("s_{}", name), s_val.iter().copied().collect());
        }
        state
    }

    fn load_state_dict(&mut self, state: HashMap<String, Vec<f64>>) {
        if let Some(t_val) = state.get("t") {
            self.t = t_val[0] as usize;
        }
        for (key, values) in state {
            if let Some(name) = key.strip_prefix("m_") {
                if let Some(m_array) = self.m.get(name) {
                    let shape = m_array.raw_dim();
                    if let Ok(arr) = Array::from_shape_vec(shape, values) {
                        self.m.insert(name.to_string(), arr);
                    }
                }
            } else if let Some(name) = key.strip_prefix("s_") {
                if let Some(s_array) = self.s.get(name) {
                    let shape = s_array.raw_dim();
                    if let Ok(arr) = Array::from_shape_vec(shape, values) {
                        self.s.insert(name.to_string(), arr);
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
    fn test_adabelief_step_decreases_parameters() {
        let mut param = Parameter::new("w", array![[1.0, 2.0], [3.0, 4.0]]);
        param.set_grad(array![[0.1, 0.2], [0.3, 0.4]]);
        let param = param.into_shared();
        let groups = single_group(
            vec![Arc::clone(&param)],
            OptimizerConfig {
                learning_rate: 0.001,
                weight_decay: 0.01,
                ..Default::default()
            },
        );
        let mut optimizer = AdaBeliefOptimizer::new(groups);

        for _ in 0..5 {
            optimizer.step().unwrap();
        }

        {
            let param = param.lock().unwrap();
            assert!(param.value()[[0, 0]] < 1.0);
            assert!(param.value()[[1, 1]] < 4.0);
        }

        let state = optimizer.state_dict();
        assert!(state.contains_key("t"));
        assert!(state.contains_key("m_w"));
        assert!(state.contains_key("s_w"));
    }
}

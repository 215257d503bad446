//! SGD optimizer with momentum.

use super::common::{
    clip_gradient, first_group_lr, global_grad_norm, set_all_lrs, zero_grads, Optimizer,
};
use crate::group::SharedParamGroups;
use crate::OptimResult;
use scirs2_core::ndarray::{Array, Ix2};
use std::collections::HashMap;
use std::sync::Arc;

/// SGD optimizer with momentum.
///
/// A group momentum of 0.0 degenerates to plain gradient descent.
#[derive(Debug)]
pub struct SgdOptimizer {
    groups: SharedParamGroups,
    /// Momentum buffers for each parameter.
    velocity: HashMap<String, Array<f64, Ix2>>,
}

impl SgdOptimizer {
    /// Create a new SGD optimizer over `groups`.
    pub fn new(groups: SharedParamGroups) -> Self {
        Self {
            groups,
            velocity: HashMap::new(),
        }
    }
}

impl Optimizer for SgdOptimizer {
    fn step(&mut self) -> OptimResult<()> {
        let groups = self.groups.lock().unwrap();
        let total_norm = global_grad_norm(&groups);

        for group in groups.iter() {
            let lr = group.config.learning_rate;
            let momentum = group.config.momentum;

            for handle in &group.params {
                let mut param = handle.lock().unwrap();
                let mut grad = match param.grad() {
                    Some(g) => g.clone(),
                    None => continue,
                };
                clip_gradient(&mut grad, &group.config, total_norm);

                if !self.velocity.contains_key(param.name()) {
                    self.velocity
                        .insert(param.name().to_string(), Array::zeros(grad.raw_dim()));
                }
                let velocity = self.velocity.get_mut(param.name()).unwrap();

                // v = momentum * v + lr * grad
                *velocity = &*velocity * momentum + &(grad * lr);

                let new_value = param.value() - &*velocity;
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
        for (name, velocity) in &self.velocity {
            state.insert(
                format!("velocity_{}", name),
                velocity.iter().copied().collect(),
            );
        }
        state
    }

    fn load_state_dict(&mut self, state: HashMap<String, Vec<f64>>) {
        for (key, values) in state {
            if let Some(name) = key.strip_prefix("velocity_") {
                if let Some(velocity) = self.velocity.get(name) {
                    let shape = velocity.raw_dim();
                    if let Ok(new_velocity) = Array::from_shape_vec(shape, values) {
                        self.velocity.insert(name.to_string(), new_velocity);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::common::{GradClipMode, OptimizerConfig};
    use super::*;
    use crate::group::single_group;
    use crate::parameter::Parameter;
    use scirs2_core::ndarray::array;

    fn one_param_groups(config: OptimizerConfig) -> (SharedParamGroups, crate::SharedParam) {
        let mut param = Parameter::new("w", array![[1.0, 2.0]]);
        param.set_grad(array![[0.1, 0.1]]);
        let param = param.into_shared();
        let groups = single_group(vec![Arc::clone(&param)], config);
        (groups, param)
    }

    #[test]
    fn test_sgd_step_decreases_parameters() {
        let config = OptimizerConfig {
            learning_rate: 0.1,
            momentum: 0.9,
            ..Default::default()
        };
        let (groups, param) = one_param_groups(config);
        let mut optimizer = SgdOptimizer::new(groups);

        optimizer.step().unwrap();

        let param = param.lock().unwrap();
        assert!(param.value()[[0, 0]] < 1.0);
        assert!(param.value()[[0, 1]] < 2.0);

        let state = optimizer.state_dict();
        assert!(state.contains_key("velocity_w"));
    }

    #[test]
    fn test_plain_sgd_update_rule() {
        let config = OptimizerConfig {
            learning_rate: 0.5,
            momentum: 0.0,
            ..Default::default()
        };
        let (groups, param) = one_param_groups(config);
        let mut optimizer = SgdOptimizer::new(groups);

        optimizer.step().unwrap();

        // w - lr * g
        let param = param.lock().unwrap();
        assert!((param.value()[[0, 0]] - 0.95).abs() < 1e-12);
        assert!((param.value()[[0, 1]] - 1.95).abs() < 1e-12);
    }

    #[test]
    fn test_momentum_accumulates_across_steps() {
        let config = OptimizerConfig {
            learning_rate: 0.1,
            momentum: 0.9,
            ..Default::default()
        };
        let (groups, param) = one_param_groups(config);
        let mut optimizer = SgdOptimizer::new(groups);

        optimizer.step().unwrap();
        let after_first = param.lock().unwrap().value()[[0, 0]];
        optimizer.step().unwrap();
        let after_second = param.lock().unwrap().value()[[0, 0]];

        // second step moves further than the first under constant gradient
        assert!((1.0 - after_first) < (after_first - after_second));
    }

    #[test]
    fn test_gradient_clipping() {
        let config = OptimizerConfig {
            learning_rate: 0.1,
            momentum: 0.0,
            grad_clip: Some(0.05),
            grad_clip_mode: GradClipMode::Value,
            ..Default::default()
        };
        let mut param = Parameter::new("w", array![[1.0]]);
        param.set_grad(array![[1.0]]);
        let param = param.into_shared();
        let groups = single_group(vec![Arc::clone(&param)], config);
        let mut optimizer = SgdOptimizer::new(groups);

        optimizer.step().unwrap();

        // gradient clipped to 0.05, so the update is lr * 0.05
        let param = param.lock().unwrap();
        assert!((param.value()[[0, 0]] - 0.995).abs() < 1e-12);
    }

    #[test]
    fn test_parameter_without_gradient_is_skipped() {
        let frozen = Parameter::new("frozen", array![[5.0]]).into_shared();
        let groups = single_group(
            vec![Arc::clone(&frozen)],
            OptimizerConfig {
                learning_rate: 0.1,
                ..Default::default()
            },
        );
        let mut optimizer = SgdOptimizer::new(groups);

        optimizer.step().unwrap();

        assert_eq!(frozen.lock().unwrap().value()[[0, 0]], 5.0);
        assert!(optimizer.state_dict().is_empty());
    }

    #[test]
    fn test_zero_grad_drops_gradients() {
        let (groups, param) = one_param_groups(OptimizerConfig::default());
        let mut optimizer = SgdOptimizer::new(groups);
        optimizer.zero_grad();
        assert!(param.lock().unwrap().grad().is_none());
    }
}

//! Model interface: trainable-parameter containers.

use crate::parameter::{Parameter, SharedParam};
use scirs2_core::ndarray::{Array, ArrayView, Axis, Ix2};
use std::sync::Arc;

/// Trait for containers of trainable parameters.
///
/// An optimizer binds to the shared handles returned here; updates it makes
/// are visible to the model and gradients the model accumulates are visible
/// to the optimizer.
pub trait TrainableModel {
    /// Shared handles to every trainable parameter, in a stable order.
    fn trainable_parameters(&self) -> Vec<SharedParam>;
}

/// A simple linear model for testing and demonstration.
#[derive(Debug)]
pub struct LinearModel {
    /// Weight matrix, shape `(input_dim, output_dim)`.
    weight: SharedParam,
    /// Bias row, shape `(1, output_dim)`.
    bias: SharedParam,
}

impl LinearModel {
    /// Create a new zero-initialized linear model.
    pub fn new(input_dim: usize, output_dim: usize) -> Self {
        Self {
            weight: Parameter::new("weight", Array::zeros((input_dim, output_dim))).into_shared(),
            bias: Parameter::new("bias", Array::zeros((1, output_dim))).into_shared(),
        }
    }

    /// Linear transformation: `Y = X @ W + b`.
    pub fn forward(&self, input: &ArrayView<f64, Ix2>) -> Array<f64, Ix2> {
        let weight = self.weight.lock().unwrap();
        let bias = self.bias.lock().unwrap();
        input.dot(weight.value()) + bias.value()
    }

    /// Forward pass, mean-squared-error loss, and backward pass.
    ///
    /// Gradients are accumulated into the shared parameters; the returned
    /// value is the loss.
    pub fn backward_mse(&self, input: &ArrayView<f64, Ix2>, target: &ArrayView<f64, Ix2>) -> f64 {
        let output = self.forward(input);
        let n = output.len() as f64;
        let diff = &output - target;
        let loss = diff.mapv(|d| d * d).sum() / n;

        // dL/dY = 2 * (Y - T) / n
        let grad_output = diff * (2.0 / n);
        let grad_weight = input.t().dot(&grad_output);
        let grad_bias = grad_output.sum_axis(Axis(0)).insert_axis(Axis(0));

        self.weight.lock().unwrap().accumulate_grad(&grad_weight);
        self.bias.lock().unwrap().accumulate_grad(&grad_bias);
        loss
    }
}

impl TrainableModel for LinearModel {
    fn trainable_parameters(&self) -> Vec<SharedParam> {
        vec![Arc::clone(&self.weight), Arc::clone(&self.bias)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scirs2_core::ndarray::arr2;

    #[test]
    fn test_linear_model_forward_shape() {
        let model = LinearModel::new(3, 2);
        let input = arr2(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        let output = model.forward(&input.view());
        assert_eq!(output.shape(), &[2, 2]);
    }

    #[test]
    fn test_backward_mse_fills_gradients() {
        let model = LinearModel::new(3, 2);
        let input = arr2(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        let target = arr2(&[[1.0, 0.0], [0.0, 1.0]]);

        let loss = model.backward_mse(&input.view(), &target.view());
        assert!(loss > 0.0);

        for param in model.trainable_parameters() {
            let param = param.lock().unwrap();
            let grad = param.grad().expect("backward should set gradients");
            assert_eq!(grad.shape(), param.value().shape());
        }
    }

    #[test]
    fn test_trainable_parameters_alias_model_storage() {
        let model = LinearModel::new(2, 1);
        let params = model.trainable_parameters();
        params[0].lock().unwrap().value_mut()[[0, 0]] = 7.0;

        let input = arr2(&[[1.0, 0.0]]);
        let output = model.forward(&input.view());
        assert_eq!(output[[0, 0]], 7.0);
    }
}

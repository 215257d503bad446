//! Named trainable parameters with optional gradients.
//!
//! A [`Parameter`] pairs a mutable value tensor with an optional gradient
//! tensor. The gradient is an explicit `Option`: a parameter that never took
//! part in a backward pass has no gradient, and optimizers skip it entirely.
//!
//! Parameters are shared between the owning model and any optimizers through
//! [`SharedParam`] handles, so an in-place update made by an optimizer is
//! immediately visible to the model and vice versa.

use scirs2_core::ndarray::{Array, Ix2};
use std::sync::{Arc, Mutex};

/// Shared, mutable handle to a [`Parameter`].
pub type SharedParam = Arc<Mutex<Parameter>>;

/// A named, trainable parameter.
#[derive(Debug, Clone)]
pub struct Parameter {
    /// Name used to key per-parameter optimizer state.
    name: String,
    /// Current value.
    value: Array<f64, Ix2>,
    /// Accumulated gradient, if the parameter took part in a backward pass.
    grad: Option<Array<f64, Ix2>>,
}

impl Parameter {
    /// Create a new parameter with no gradient.
    pub fn new(name: impl Into<String>, value: Array<f64, Ix2>) -> Self {
        Self {
            name: name.into(),
            value,
            grad: None,
        }
    }

    /// Wrap this parameter in a shared handle.
    pub fn into_shared(self) -> SharedParam {
        Arc::new(Mutex::new(self))
    }

    /// Name of this parameter.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current value.
    pub fn value(&self) -> &Array<f64, Ix2> {
        &self.value
    }

    /// Mutable access to the current value.
    pub fn value_mut(&mut self) -> &mut Array<f64, Ix2> {
        &mut self.value
    }

    /// Current gradient, if any.
    pub fn grad(&self) -> Option<&Array<f64, Ix2>> {
        self.grad.as_ref()
    }

    /// Replace the gradient.
    pub fn set_grad(&mut self, grad: Array<f64, Ix2>) {
        self.grad = Some(grad);
    }

    /// Add `grad` into the accumulated gradient, creating it if absent.
    pub fn accumulate_grad(&mut self, grad: &Array<f64, Ix2>) {
        match self.grad.as_mut() {
            Some(existing) => *existing += grad,
            None => self.grad = Some(grad.clone()),
        }
    }

    /// Drop the gradient. The parameter is skipped by optimizers until the
    /// next backward pass fills it in again.
    pub fn clear_grad(&mut self) {
        self.grad = None;
    }
}

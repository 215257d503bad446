//! Optimizers over shared parameter groups.
//!
//! This module provides the optimization algorithms used for training
//! gradient-based models, all operating in place on a shared
//! parameter-group list.
//!
//! # Available Optimizers
//!
//! ## Basic Optimizers
//! - [`SgdOptimizer`]: Stochastic Gradient Descent with momentum
//!
//! ## Adaptive Learning Rate Optimizers
//! - [`AdamOptimizer`]: Adaptive Moment Estimation
//! - [`AdamWOptimizer`]: Adam with decoupled weight decay
//! - [`AdaBeliefOptimizer`]: Adapts step size by belief in gradient direction
//!
//! ## Meta-Optimizers (Wrappers)
//! - [`SamOptimizer`]: Sharpness Aware Minimization
//!
//! # Common Types
//! - [`Optimizer`]: Core trait that all optimizers implement
//! - [`OptimizerConfig`]: Per-group hyperparameters
//! - [`GradClipMode`]: Gradient clipping modes (by value or by norm)

pub mod adabelief;
pub mod adam;
pub mod adamw;
pub mod common;
pub mod sam;
pub mod sgd;

// Re-export common types
pub use common::{GradClipMode, Optimizer, OptimizerConfig};

// Re-export all optimizers
pub use adabelief::AdaBeliefOptimizer;
pub use adam::AdamOptimizer;
pub use adamw::AdamWOptimizer;
pub use sam::SamOptimizer;
pub use sgd::SgdOptimizer;

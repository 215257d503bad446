//! Gradient-based optimizers with parameter groups, by-name selection, and
//! Sharpness-Aware Minimization.
//!
//! This crate provides:
//! - Named trainable parameters with explicit optional gradients, shared
//!   between a model and its optimizers
//! - Parameter groups with per-group hyperparameters behind an explicitly
//!   shared group list
//! - SGD (plain and momentum), Adam, AdamW and AdaBelief update rules
//! - A SAM (Sharpness-Aware Minimization) wrapper optimizer driven by a
//!   closure that re-evaluates the loss at the perturbed parameters
//! - By-name optimizer selection for training-loop configuration
//!
//! # Example
//!
//! ```
//! use scirs2_core::ndarray::arr2;
//! use sharpmin::{select_optimizer, LinearModel, Optimizer, DEFAULT_BETAS, DEFAULT_MOMENTUM};
//!
//! let model = LinearModel::new(2, 1);
//! let mut optimizer =
//!     select_optimizer("SAM", &model, 0.01, DEFAULT_MOMENTUM, DEFAULT_BETAS).unwrap();
//!
//! let input = arr2(&[[1.0, 2.0]]);
//! let target = arr2(&[[3.0]]);
//! let loss = optimizer
//!     .step_with(&mut || Ok(model.backward_mse(&input.view(), &target.view())))
//!     .unwrap();
//! assert!(loss.is_finite());
//! ```

mod error;
mod group;
mod model;
mod optimizers;
mod parameter;
mod selection;

#[cfg(feature = "structured-logging")]
pub mod structured_logging;

pub use error::{OptimError, OptimResult};
pub use group::{shared_groups, single_group, ParamGroup, SharedParamGroups};
pub use model::{LinearModel, TrainableModel};
pub use optimizers::{
    AdaBeliefOptimizer, AdamOptimizer, AdamWOptimizer, GradClipMode, Optimizer, OptimizerConfig,
    SamOptimizer, SgdOptimizer,
};
pub use parameter::{Parameter, SharedParam};
pub use selection::{select_optimizer, DEFAULT_BETAS, DEFAULT_MOMENTUM};

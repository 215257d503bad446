//! Optimizer selection by name.
//!
//! [`select_optimizer`] is the single entry point a training loop needs: it
//! maps a textual optimizer name plus hyperparameters to a configured
//! optimizer bound to the model's trainable parameters. The SAM variants wrap
//! the corresponding base optimizer around the same shared group list.

use crate::group::single_group;
use crate::model::TrainableModel;
use crate::optimizers::{
    AdaBeliefOptimizer, AdamOptimizer, AdamWOptimizer, Optimizer, OptimizerConfig, SamOptimizer,
    SgdOptimizer,
};
use crate::{OptimError, OptimResult};

/// Conventional momentum for the SGD-momentum variants.
pub const DEFAULT_MOMENTUM: f64 = 0.9;

/// Conventional decay rates for the Adam-family variants.
pub const DEFAULT_BETAS: (f64, f64) = (0.9, 0.999);

/// Construct an optimizer by name, bound to the model's trainable parameters.
///
/// Recognized names: `"SGD"`, `"momentum"`, `"Adam"`, `"AdamW"`,
/// `"AdaBelief"`, `"SAM"` (SGD-with-momentum base) and `"SAM_Adam"` (Adam
/// base). `momentum` only affects the momentum/SAM variants and `betas` only
/// the Adam-family variants; pass [`DEFAULT_MOMENTUM`] and [`DEFAULT_BETAS`]
/// when in doubt. Any other name fails with
/// [`OptimError::UnsupportedOptimizer`] before anything is constructed.
pub fn select_optimizer(
    name: &str,
    model: &dyn TrainableModel,
    learning_rate: f64,
    momentum: f64,
    betas: (f64, f64),
) -> OptimResult<Box<dyn Optimizer>> {
    let params = model.trainable_parameters();
    let config = |momentum: f64| OptimizerConfig {
        learning_rate,
        momentum,
        beta1: betas.0,
        beta2: betas.1,
        ..OptimizerConfig::default()
    };

    match name {
        "SGD" => Ok(Box::new(SgdOptimizer::new(single_group(
            params,
            config(0.0),
        )))),
        "momentum" => Ok(Box::new(SgdOptimizer::new(single_group(
            params,
            config(momentum),
        )))),
        "Adam" => Ok(Box::new(AdamOptimizer::new(single_group(
            params,
            config(0.0),
        )))),
        "AdamW" => Ok(Box::new(AdamWOptimizer::new(single_group(
            params,
            config(0.0),
        )))),
        "AdaBelief" => Ok(Box::new(AdaBeliefOptimizer::new(single_group(
            params,
            config(0.0),
        )))),
        "SAM" => {
            let base = SgdOptimizer::new(single_group(params, config(momentum)));
            Ok(Box::new(SamOptimizer::new(base)?))
        }
        "SAM_Adam" => {
            let base = AdamOptimizer::new(single_group(params, config(0.0)));
            Ok(Box::new(SamOptimizer::new(base)?))
        }
        _ => Err(OptimError::UnsupportedOptimizer(name.to_string())),
    }
}

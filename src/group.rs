//! Parameter groups with per-group hyperparameters.
//!
//! A [`ParamGroup`] is an ordered collection of parameters that share one set
//! of hyperparameters. The full group list is held behind a
//! [`SharedParamGroups`] handle: a wrapper optimizer and the base optimizer it
//! delegates to hold clones of the *same* `Arc`, so hyperparameter or
//! membership changes made through either handle are visible through both.
//! `Arc::ptr_eq` on the two handles is the documented identity contract.

use crate::optimizers::OptimizerConfig;
use crate::parameter::SharedParam;
use std::sync::{Arc, Mutex};

/// Shared, mutable handle to an optimizer's group list.
pub type SharedParamGroups = Arc<Mutex<Vec<ParamGroup>>>;

/// A group of parameters sharing one set of hyperparameters.
#[derive(Debug)]
pub struct ParamGroup {
    /// The parameters managed by this group.
    pub params: Vec<SharedParam>,
    /// Hyperparameters applied to every parameter in the group.
    pub config: OptimizerConfig,
}

impl ParamGroup {
    /// Create a new parameter group.
    pub fn new(params: Vec<SharedParam>, config: OptimizerConfig) -> Self {
        Self { params, config }
    }
}

/// Wrap a list of groups in a shared handle.
pub fn shared_groups(groups: Vec<ParamGroup>) -> SharedParamGroups {
    Arc::new(Mutex::new(groups))
}

/// Convenience: a shared group list containing one group over `params`.
pub fn single_group(params: Vec<SharedParam>, config: OptimizerConfig) -> SharedParamGroups {
    shared_groups(vec![ParamGroup::new(params, config)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::Parameter;
    use scirs2_core::ndarray::array;

    #[test]
    fn test_hyperparameter_change_visible_through_both_handles() {
        let param = Parameter::new("w", array![[1.0]]).into_shared();
        let groups = single_group(vec![param], OptimizerConfig::default());
        let alias = Arc::clone(&groups);

        groups.lock().unwrap()[0].config.learning_rate = 0.5;
        assert_eq!(alias.lock().unwrap()[0].config.learning_rate, 0.5);
        assert!(Arc::ptr_eq(&groups, &alias));
    }

    #[test]
    fn test_membership_change_visible_through_both_handles() {
        let groups = single_group(Vec::new(), OptimizerConfig::default());
        let alias = Arc::clone(&groups);

        let extra = Parameter::new("b", array![[0.0]]).into_shared();
        groups.lock().unwrap()[0].params.push(extra);
        assert_eq!(alias.lock().unwrap()[0].params.len(), 1);
    }
}

/*!
The model slot: the single place that knows whether a model can be used.
*/

use crate::error::LesionError;
use lesion_core::prelude::Classifier;
use parking_lot::RwLock;
use std::sync::Arc;

/// Load progress of the bundled model.
#[derive(Debug, Clone)]
pub enum LoadState {
    NotLoaded,
    Loading,
    Ready(Arc<Classifier>),

    /// The load failed; holds the reason shown to the user.
    Failed(String),
}

impl LoadState {
    pub fn is_ready(&self) -> bool {
        matches!(self, LoadState::Ready(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            LoadState::NotLoaded => "not loaded",
            LoadState::Loading => "loading",
            LoadState::Ready(_) => "ready",
            LoadState::Failed(_) => "failed",
        }
    }
}

/// Holds the model and its [`LoadState`].
///
/// Readers only ever get a cloned [`Arc`] to a ready classifier, so a
/// reload never pulls a model out from under a running prediction.
#[derive(Debug)]
pub struct ModelSlot {
    state: RwLock<LoadState>,
}

impl Default for ModelSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelSlot {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LoadState::NotLoaded),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> LoadState {
        self.state.read().clone()
    }

    /// The loaded classifier.
    ///
    /// # Errors
    ///
    /// [`LesionError::NotReady`] unless a model is loaded.
    pub fn classifier(&self) -> Result<Arc<Classifier>, LesionError> {
        match &*self.state.read() {
            LoadState::Ready(classifier) => Ok(classifier.clone()),
            _ => Err(LesionError::NotReady),
        }
    }

    pub(crate) fn begin_loading(&self) -> Result<(), LesionError> {
        let mut state = self.state.write();
        if matches!(*state, LoadState::Loading) {
            return Err(LesionError::AlreadyLoading);
        }

        *state = LoadState::Loading;
        Ok(())
    }

    pub(crate) fn finish_loading(&self, result: Result<Classifier, String>) {
        *self.state.write() = match result {
            Ok(classifier) => LoadState::Ready(Arc::new(classifier)),
            Err(reason) => LoadState::Failed(reason),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesion_core::{
        prelude::{Inferer, ModelSpec},
        tract_core::prelude::Tensor,
    };

    struct DummyInferer;

    impl Inferer for DummyInferer {
        fn infer(&self, _input: Tensor) -> anyhow::Result<Vec<f32>> {
            Ok(vec![0.5, 0.5])
        }

        fn input_shapes(&self) -> &[(String, Vec<usize>)] {
            &[]
        }

        fn output_shapes(&self) -> &[(String, Vec<usize>)] {
            &[]
        }
    }

    fn classifier() -> Classifier {
        Classifier::new(ModelSpec::patch_vit(), DummyInferer).unwrap()
    }

    #[test]
    fn starts_not_ready() {
        let slot = ModelSlot::new();
        assert!(matches!(slot.state(), LoadState::NotLoaded));
        assert!(matches!(slot.classifier(), Err(LesionError::NotReady)));
    }

    #[test]
    fn not_ready_while_loading() {
        let slot = ModelSlot::new();
        slot.begin_loading().unwrap();

        assert!(matches!(slot.classifier(), Err(LesionError::NotReady)));
        assert!(matches!(
            slot.begin_loading(),
            Err(LesionError::AlreadyLoading)
        ));
    }

    #[test]
    fn ready_after_load() {
        let slot = ModelSlot::new();
        slot.begin_loading().unwrap();
        slot.finish_loading(Ok(classifier()));

        assert!(slot.state().is_ready());
        assert!(slot.classifier().is_ok());
    }

    #[test]
    fn failed_load_can_be_retried() {
        let slot = ModelSlot::new();
        slot.begin_loading().unwrap();
        slot.finish_loading(Err("invalid asset".to_owned()));

        match slot.state() {
            LoadState::Failed(reason) => assert_eq!(reason, "invalid asset"),
            other => panic!("unexpected state {:?}", other),
        }
        assert!(matches!(slot.classifier(), Err(LesionError::NotReady)));

        slot.begin_loading().unwrap();
        slot.finish_loading(Ok(classifier()));
        assert!(slot.state().is_ready());
    }

    #[test]
    fn reload_keeps_old_handle_alive() {
        let slot = ModelSlot::new();
        slot.begin_loading().unwrap();
        slot.finish_loading(Ok(classifier()));

        let held = slot.classifier().unwrap();
        slot.begin_loading().unwrap();

        assert!(matches!(slot.classifier(), Err(LesionError::NotReady)));
        assert_eq!(held.spec().labels.len(), 2);
    }
}

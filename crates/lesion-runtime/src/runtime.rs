/*!
Scheduling of model loads and predictions.

All work runs on a bounded worker pool. Every request gets a new
generation; workers give up on a request once a newer one exists, and
the controller discards any result that isn't for the latest request.
*/

use crate::{
    config::RuntimeConfig,
    error::LesionError,
    state::{LoadState, ModelSlot},
    status::Status,
    timing::LatencyStats,
};
use image::RgbImage;
use lesion_asset::{AssetData, AssetSource, Materializer};
use lesion_core::prelude::{Classifier, ClassifyError, Prediction};
use parking_lot::Mutex;
use rand::{rngs::StdRng, SeedableRng};
use std::{
    panic::{self, AssertUnwindSafe},
    path::Path,
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        mpsc::{self, Receiver, Sender},
        Arc,
    },
    time::{Duration, Instant},
};

/// State shared between a [`Controller`] and its workers.
pub struct Runtime {
    config: RuntimeConfig,
    slot: ModelSlot,
    generation: AtomicU64,
    in_flight: AtomicUsize,
    latency: Mutex<LatencyStats>,
}

impl Runtime {
    fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            slot: ModelSlot::new(),
            generation: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            latency: Mutex::new(LatencyStats::new()),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn slot(&self) -> &ModelSlot {
        &self.slot
    }

    /// The latest generation handed out.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation() == generation
    }

    /// Predictions queued or running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Latency of completed predictions so far.
    pub fn latency(&self) -> LatencyStats {
        self.latency.lock().clone()
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn acquire(self: &Arc<Self>) -> Result<InFlight, LesionError> {
        let limit = self.config.max_in_flight.max(1);
        self.in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < limit).then(|| n + 1)
            })
            .map_err(|_| LesionError::Busy { limit })?;

        Ok(InFlight(self.clone()))
    }

    fn rng(&self, generation: u64) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(generation)),
            None => StdRng::from_entropy(),
        }
    }

    /// Run one prediction. `Ok(None)` if a newer request superseded it.
    fn predict(
        &self,
        classifier: &Classifier,
        image: &RgbImage,
        generation: u64,
    ) -> Result<Option<Prediction>, ClassifyError> {
        if !self.is_current(generation) {
            return Ok(None);
        }

        let start = Instant::now();
        let input = classifier.preprocess(image, &mut self.rng(generation))?;

        if !self.is_current(generation) {
            return Ok(None);
        }

        let scores = classifier.infer(input)?;
        let prediction = classifier.postprocess(&scores)?;

        self.latency.lock().add(start.elapsed());
        Ok(Some(prediction))
    }
}

/// Slot in the in-flight budget, released on drop.
struct InFlight(Arc<Runtime>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

enum Update {
    Loaded {
        generation: u64,
        result: Result<(), String>,
    },
    Predicted {
        generation: u64,
        outcome: Result<Prediction, LesionError>,
    },
    Skipped {
        generation: u64,
    },
}

/// The display side of the runtime.
///
/// Requests are made from the thread owning the controller and never
/// block on model work. Results come back over a channel and are only
/// applied to [`Controller::status`] when that thread calls
/// [`Controller::pump`] or one of the waiting variants.
pub struct Controller {
    runtime: Arc<Runtime>,
    pool: rayon::ThreadPool,
    sender: Sender<Update>,
    updates: Receiver<Update>,
    pending: usize,
    status: Status,
}

impl Controller {
    /// Create a controller and its worker pool.
    pub fn new(config: RuntimeConfig) -> Result<Self, LesionError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_threads.max(1))
            .thread_name(|idx| format!("lesion-worker-{}", idx))
            .build()
            .map_err(|e| LesionError::Internal(e.into()))?;

        let (sender, updates) = mpsc::channel();

        Ok(Self {
            runtime: Arc::new(Runtime::new(config)),
            pool,
            sender,
            updates,
            pending: 0,
            status: Status::default(),
        })
    }

    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn load_state(&self) -> LoadState {
        self.runtime.slot.state()
    }

    /// True when no load or prediction is waiting to be applied.
    pub fn is_idle(&self) -> bool {
        self.pending == 0
    }

    /// Load a model on the worker pool using `load`.
    ///
    /// Predictions are rejected until the load finishes. Any prediction
    /// already running against a previous model is treated as stale.
    ///
    /// # Errors
    ///
    /// [`LesionError::AlreadyLoading`] if a load is in progress.
    pub fn load_with<F>(&mut self, load: F) -> Result<(), LesionError>
    where
        F: FnOnce() -> anyhow::Result<Classifier> + Send + 'static,
    {
        self.runtime.slot.begin_loading()?;
        let generation = self.runtime.next_generation();
        self.status = Status::loading();
        self.pending += 1;

        let runtime = self.runtime.clone();
        let sender = self.sender.clone();
        self.pool.spawn(move || {
            let start = Instant::now();
            let result = match panic::catch_unwind(AssertUnwindSafe(load)) {
                Ok(Ok(classifier)) => {
                    log::debug!(
                        "loaded model {:?} in {:?}",
                        classifier.spec().name,
                        start.elapsed()
                    );
                    Ok(classifier)
                }
                Ok(Err(e)) => Err(format!("{:#}", e)),
                Err(_) => Err("model loader panicked".to_owned()),
            };

            let outcome = match &result {
                Ok(_) => Ok(()),
                Err(reason) => {
                    log::warn!("failed to load model: {}", reason);
                    Err(reason.clone())
                }
            };

            runtime.slot.finish_loading(result);

            // The controller may be gone already; nothing left to tell.
            let _ = sender.send(Update::Loaded {
                generation,
                result: outcome,
            });
        });

        Ok(())
    }

    /// Copy the bundled asset `name` to local storage if needed, then load it.
    pub fn load_asset<S>(
        &mut self,
        materializer: Arc<Materializer<S>>,
        name: impl Into<String>,
    ) -> Result<(), LesionError>
    where
        S: AssetSource + 'static,
    {
        let name = name.into();
        self.load_with(move || {
            let path = materializer.materialize(&name)?;
            let asset = AssetData::load(&path)?;
            Ok(asset.load_classifier()?)
        })
    }

    /// Queue a prediction for `image`, superseding any earlier request.
    ///
    /// Returns the generation of the new request.
    ///
    /// # Errors
    ///
    /// [`LesionError::NotReady`] unless a model is loaded, and
    /// [`LesionError::Busy`] when too many predictions are in flight.
    pub fn submit(&mut self, image: RgbImage) -> Result<u64, LesionError> {
        let classifier = self.runtime.slot.classifier()?;
        let permit = self.runtime.acquire()?;
        let generation = self.runtime.next_generation();

        self.status = Status::analyzing(generation, Some(image.dimensions()));
        self.pending += 1;

        let runtime = self.runtime.clone();
        let sender = self.sender.clone();
        self.pool.spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                runtime.predict(&classifier, &image, generation)
            }));
            drop(permit);

            let update = match outcome {
                Ok(Ok(Some(prediction))) => Update::Predicted {
                    generation,
                    outcome: Ok(prediction),
                },
                Ok(Ok(None)) => Update::Skipped { generation },
                Ok(Err(e)) => Update::Predicted {
                    generation,
                    outcome: Err(e.into()),
                },
                Err(_) => Update::Predicted {
                    generation,
                    outcome: Err(LesionError::Internal(anyhow::anyhow!(
                        "prediction worker panicked"
                    ))),
                },
            };

            let _ = sender.send(update);
        });

        Ok(generation)
    }

    /// Decode the image at `path` and queue a prediction for it.
    ///
    /// A decode failure is shown as the status of a new request.
    pub fn submit_path(&mut self, path: &Path) -> Result<u64, LesionError> {
        self.runtime.slot.classifier()?;

        match image::open(path) {
            Ok(image) => self.submit(image.to_rgb8()),
            Err(e) => {
                let generation = self.runtime.next_generation();
                let err = LesionError::from(e);

                log::warn!("could not read {:?}: {}", path, err);
                self.status = Status::analyzing(generation, None).failed(&err);
                Err(err)
            }
        }
    }

    /// Apply every update that has arrived. Never blocks.
    ///
    /// Returns the number of updates applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.updates.try_recv() {
            self.apply(update);
            applied += 1;
        }

        applied
    }

    /// Wait up to `timeout` for one update and apply it.
    pub fn pump_timeout(&mut self, timeout: Duration) -> bool {
        match self.updates.recv_timeout(timeout) {
            Ok(update) => {
                self.apply(update);
                true
            }
            Err(_) => false,
        }
    }

    /// Block until every load and prediction has reported back.
    pub fn wait_idle(&mut self) {
        while self.pending > 0 {
            match self.updates.recv() {
                Ok(update) => self.apply(update),
                Err(_) => break,
            }
        }
    }

    fn apply(&mut self, update: Update) {
        self.pending = self.pending.saturating_sub(1);

        match update {
            Update::Loaded { generation, .. } if !self.runtime.is_current(generation) => {
                log::debug!("dropping stale load result for request {}", generation);
            }
            Update::Loaded { result, .. } => {
                self.status = match result {
                    Ok(()) => Status::ready(),
                    Err(reason) => Status::load_failed(&reason),
                };
            }
            Update::Predicted {
                generation,
                outcome,
            } => {
                if generation != self.status.generation || !self.runtime.is_current(generation) {
                    log::debug!("dropping stale result for request {}", generation);
                    return;
                }

                self.status = match outcome {
                    Ok(prediction) => self.status.success(prediction),
                    Err(e) => {
                        log::warn!("request {} failed: {}", generation, e);
                        self.status.failed(&e)
                    }
                };
            }
            Update::Skipped { generation } => {
                log::debug!("request {} was superseded before finishing", generation);
            }
        }
    }
}

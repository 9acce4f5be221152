//! Simulation session: owns one parameter set and the collections of the
//! current run, and drives the three phases in order.
//!
//! Every phase builds its collection locally and publishes it only on
//! success, so a failed phase never leaves partial output behind. Saving
//! to a [`RunStore`] is best-effort: failures are logged and the
//! in-memory results stay valid.

use mcs_core::{McsError, Result, SimulationParameters, SimulationResult, Task, UserMovementEvent};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{error, info, warn};

use crate::config::{GeneratorConfig, SimulationWindow, now_epoch_seconds};
use crate::matcher::compute_candidates;
use crate::mobility::MobilityGenerator;
use crate::store::{RunId, RunStore};
use crate::tasks::TaskGenerator;

/// Progress of the current run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    MovementsReady,
    TasksReady,
    Completed,
    /// The mobility phase failed; later phases are refused until a new run
    Failed,
}

/// Builder for [`SimulationSession`]
#[derive(Debug, Clone, Default)]
pub struct SessionBuilder {
    parameters: SimulationParameters,
    config: GeneratorConfig,
    seed: Option<u64>,
    window_end: Option<f64>,
    store: Option<RunStore>,
}

impl SessionBuilder {
    pub fn parameters(mut self, parameters: SimulationParameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Seed the random source for reproducible runs
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Pin the end of the simulated window (epoch seconds) instead of using
    /// the wall clock at the start of each run
    pub fn window_end(mut self, end: f64) -> Self {
        self.window_end = Some(end);
        self
    }

    pub fn store(mut self, store: RunStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Result<SimulationSession> {
        self.parameters.validate()?;

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(SimulationSession {
            parameters: self.parameters,
            config: self.config,
            rng,
            window_end: self.window_end,
            window: None,
            movements: Vec::new(),
            tasks: Vec::new(),
            results: Vec::new(),
            state: RunState::Idle,
            store: self.store,
            run_id: None,
        })
    }
}

/// Caller-owned simulation session
pub struct SimulationSession {
    parameters: SimulationParameters,
    config: GeneratorConfig,
    rng: StdRng,
    window_end: Option<f64>,
    window: Option<SimulationWindow>,
    movements: Vec<UserMovementEvent>,
    tasks: Vec<Task>,
    results: Vec<SimulationResult>,
    state: RunState,
    store: Option<RunStore>,
    run_id: Option<RunId>,
}

impl SimulationSession {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    /// Replace the parameters wholesale. Collections of the previous run
    /// are discarded.
    pub fn set_parameters(&mut self, parameters: SimulationParameters) -> Result<()> {
        parameters.validate()?;
        self.parameters = parameters;
        self.reset();
        Ok(())
    }

    /// Start a new run: clear all collections and generate user movements
    pub fn generate_user_movements(&mut self) -> Result<()> {
        self.reset();

        let outcome = self.fresh_window().and_then(|window| {
            let generator = MobilityGenerator::new(&self.parameters, self.config, window);
            generator.generate(&mut self.rng).map(|events| (window, events))
        });

        let (window, movements) = match outcome {
            Ok(generated) => generated,
            Err(e) => {
                error!("Mobility generation failed: {}", e);
                self.state = RunState::Failed;
                return Err(e);
            }
        };

        self.window = Some(window);
        self.movements = movements;
        self.state = RunState::MovementsReady;

        self.persist_run_start();

        Ok(())
    }

    /// Generate tasks over the movement bounding box (or the default box
    /// when no movements exist). Clears previous tasks and results.
    ///
    /// A failure marks the run as failed, like a failed mobility phase.
    pub fn generate_tasks(&mut self) -> Result<()> {
        self.ensure_not_failed("task generation")?;

        let generated = match self.window {
            Some(window) => Ok(window),
            None => self.fresh_window(),
        }
        .and_then(|window| {
            TaskGenerator::new(&self.parameters, &self.config, window, &self.movements)
                .generate(&mut self.rng)
                .map(|tasks| (window, tasks))
        });

        let (window, tasks) = match generated {
            Ok(generated) => generated,
            Err(e) => {
                error!("Task generation failed: {}", e);
                self.tasks.clear();
                self.results.clear();
                self.state = RunState::Failed;
                return Err(e);
            }
        };

        self.window = Some(window);
        self.tasks = tasks;
        self.results.clear();
        self.state = RunState::TasksReady;

        if let Some((store, id)) = self.ensure_run() {
            if let Err(e) = store.write_tasks(&id, &self.tasks) {
                warn!("Failed to save tasks for run {}: {}", id, e);
            }
        }

        Ok(())
    }

    /// Count candidates for every task
    pub fn compute_candidates_for_tasks(&mut self) -> Result<()> {
        self.ensure_not_failed("candidate matching")?;

        let results = compute_candidates(&self.movements, &self.tasks).inspect_err(|e| {
            error!("Candidate matching failed: {}", e);
        })?;

        self.results = results;
        self.state = RunState::Completed;

        if let Some((store, id)) = self.ensure_run() {
            if let Err(e) = store.write_results(&id, &self.results) {
                warn!("Failed to save results for run {}: {}", id, e);
            }
        }

        Ok(())
    }

    /// Run all three phases in order
    pub fn run(&mut self) -> Result<()> {
        info!(
            "Starting simulation: {} users, {} tasks, {} day(s), {} ({})",
            self.parameters.number_of_users,
            self.parameters.number_of_tasks,
            self.parameters.days,
            self.parameters.locomotion_type,
            self.parameters.platform_type
        );
        self.generate_user_movements()?;
        self.generate_tasks()?;
        self.compute_candidates_for_tasks()?;
        info!("Simulation complete");
        Ok(())
    }

    pub fn parameters(&self) -> &SimulationParameters {
        &self.parameters
    }

    pub fn movements(&self) -> &[UserMovementEvent] {
        &self.movements
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn results(&self) -> &[SimulationResult] {
        &self.results
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Window of the current run, once a phase has fixed it
    pub fn window(&self) -> Option<SimulationWindow> {
        self.window
    }

    /// Saved-run identifier of the current run, if a store is attached
    pub fn run_id(&self) -> Option<&RunId> {
        self.run_id.as_ref()
    }

    fn reset(&mut self) {
        self.window = None;
        self.movements.clear();
        self.tasks.clear();
        self.results.clear();
        self.run_id = None;
        self.state = RunState::Idle;
    }

    fn fresh_window(&self) -> Result<SimulationWindow> {
        let end = self.window_end.unwrap_or_else(now_epoch_seconds);
        SimulationWindow::ending_at(end, self.parameters.days)
    }

    fn ensure_not_failed(&self, phase: &str) -> Result<()> {
        if self.state == RunState::Failed {
            return Err(McsError::phase_order(format!(
                "{} requires the earlier phases of the run to succeed",
                phase
            )));
        }
        Ok(())
    }

    /// Store and run id for the current run, creating the run directory on
    /// first use. `None` when no store is attached or creation failed.
    fn ensure_run(&mut self) -> Option<(RunStore, RunId)> {
        let store = self.store.clone()?;
        if self.run_id.is_none() {
            match store.create_run() {
                Ok(id) => {
                    if let Err(e) = store.write_parameters(&id, &self.parameters) {
                        warn!("Failed to save parameters for run {}: {}", id, e);
                    }
                    self.run_id = Some(id);
                }
                Err(e) => {
                    warn!("Failed to create saved run in {}: {}", store.root().display(), e);
                    return None;
                }
            }
        }
        self.run_id.clone().map(|id| (store, id))
    }

    fn persist_run_start(&mut self) {
        if let Some((store, id)) = self.ensure_run() {
            if let Err(e) = store.write_movements(&id, &self.movements) {
                warn!("Failed to save movements for run {}: {}", id, e);
            }
        }
    }
}

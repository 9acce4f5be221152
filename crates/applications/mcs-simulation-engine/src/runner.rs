//! Background execution of a full simulation run
//!
//! Generation and matching are CPU bound, so the session is moved onto
//! tokio's blocking pool and handed back when every phase has finished.
//! Only one run can be in flight per session because the session itself
//! is moved into the worker.

use mcs_core::{McsError, Result};
use tokio::task::JoinHandle;
use tracing::info;

use crate::session::SimulationSession;

/// Handle to a run executing on the blocking pool
pub struct BackgroundRun {
    handle: JoinHandle<(SimulationSession, Result<()>)>,
}

impl BackgroundRun {
    /// Move `session` onto a blocking worker and start all phases
    pub fn spawn(mut session: SimulationSession) -> Self {
        info!("Dispatching simulation run to background worker");
        let handle = tokio::task::spawn_blocking(move || {
            let outcome = session.run();
            (session, outcome)
        });
        BackgroundRun { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the run and get the session back with the run outcome.
    ///
    /// Fails only if the worker itself panicked, in which case the session
    /// is lost.
    pub async fn join(self) -> Result<(SimulationSession, Result<()>)> {
        self.handle
            .await
            .map_err(|e| McsError::computation(format!("background worker failed: {}", e)))
    }
}

/// Run every phase of `session` off the current thread
pub async fn run_in_background(session: SimulationSession) -> Result<(SimulationSession, Result<()>)> {
    BackgroundRun::spawn(session).join().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::RunState;
    use mcs_core::SimulationParameters;

    fn session(seed: u64) -> SimulationSession {
        SimulationSession::builder()
            .parameters(SimulationParameters {
                number_of_users: 5,
                number_of_tasks: 8,
                ..Default::default()
            })
            .seed(seed)
            .window_end(1_700_000_000.0)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_background_run_returns_session() {
        let (session, outcome) = run_in_background(session(12)).await.unwrap();

        assert!(outcome.is_ok());
        assert_eq!(session.state(), RunState::Completed);
        assert_eq!(session.results().len(), 8);
    }

    #[tokio::test]
    async fn test_background_matches_foreground() {
        let mut foreground = session(21);
        foreground.run().unwrap();

        let (background, _) = run_in_background(session(21)).await.unwrap();
        assert_eq!(background.movements(), foreground.movements());
        assert_eq!(background.results(), foreground.results());
    }
}

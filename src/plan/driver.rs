//! Horizon driver: find the shortest SAT plan by trying increasing horizons

use super::Trajectory;
use crate::config::ParallelConfig;
use crate::error::{PlanError, PlanResult};
use crate::sat::{EncodingStatistics, HorizonAttempt, HorizonOutcome, Interrupt, SatEncoder};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use tracing::{debug, info, warn};

/// Runs the encoder for horizons `1..=max_horizon` and keeps the smallest success
pub struct HorizonDriver<'l> {
    encoder: SatEncoder<'l>,
    max_horizon: usize,
    parallel: ParallelConfig,
    attempts: Vec<EncodingStatistics>,
}

/// Per-horizon message sent back from the worker pool
enum WorkerReport {
    Skipped,
    Finished(PlanResult<HorizonAttempt>),
}

impl<'l> HorizonDriver<'l> {
    pub fn new(encoder: SatEncoder<'l>) -> Self {
        let max_horizon = encoder.settings().planning.max_horizon;
        let parallel = encoder.settings().solver.parallel.clone();
        Self {
            encoder,
            max_horizon,
            parallel,
            attempts: Vec::new(),
        }
    }

    pub fn with_max_horizon(mut self, max_horizon: usize) -> Self {
        self.max_horizon = max_horizon;
        self
    }

    pub fn with_parallel(mut self, parallel: ParallelConfig) -> Self {
        self.parallel = parallel;
        self
    }

    /// Statistics of every horizon that was actually solved, by horizon
    pub fn attempts(&self) -> &[EncodingStatistics] {
        &self.attempts
    }

    /// Shortest plan with at most `max_horizon` moves.
    ///
    /// `NoSolution` means every horizon was refuted. If some horizon was cut
    /// short by the solver timeout and none succeeded the result is
    /// `ResourceExhausted` instead.
    pub fn find_plan(&mut self) -> PlanResult<Trajectory> {
        let level = self.encoder.level();
        let start = level.initial_configuration();
        start.validate(&level.grid)?;
        if !level.grid.is_free(level.goal) {
            return Err(PlanError::InvalidInput(format!(
                "goal cell {} is outside the grid or on a wall",
                level.goal
            )));
        }

        self.attempts.clear();
        if start.robot == level.goal {
            info!("robot starts on the goal, returning the empty plan");
            return Ok(Trajectory::stationary(start));
        }

        if self.parallel.enabled && self.max_horizon > 1 {
            self.find_plan_parallel()
        } else {
            self.find_plan_sequential()
        }
    }

    fn find_plan_sequential(&mut self) -> PlanResult<Trajectory> {
        let mut unknown = Vec::new();

        for horizon in 1..=self.max_horizon {
            let attempt = self.encoder.solve_horizon(horizon, Interrupt::new())?;
            self.attempts.push(attempt.statistics);

            match attempt.outcome {
                HorizonOutcome::Plan(trajectory) => {
                    Self::report_success(horizon, &unknown);
                    return Ok(trajectory);
                }
                HorizonOutcome::Unsatisfiable => debug!(horizon, "no plan of this length"),
                HorizonOutcome::Unknown => {
                    warn!(horizon, "solver gave up before deciding this horizon");
                    unknown.push(horizon);
                }
            }
        }

        Err(self.exhausted(&unknown))
    }

    /// Dispatch every horizon to a worker pool. Workers skip or abandon horizons
    /// above the best success so far; collection keeps the minimum successful
    /// horizon regardless of completion order.
    fn find_plan_parallel(&mut self) -> PlanResult<Trajectory> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallel.threads)
            .build()
            .map_err(|e| PlanError::Solver(format!("failed to build worker pool: {}", e)))?;

        info!(
            threads = pool.current_num_threads(),
            max_horizon = self.max_horizon,
            "solving horizons in parallel"
        );

        let best = Arc::new(AtomicUsize::new(usize::MAX));
        let (tx, rx) = mpsc::channel();
        let encoder = &self.encoder;
        let max_horizon = self.max_horizon;

        pool.scope(|scope| {
            for horizon in 1..=max_horizon {
                let tx = tx.clone();
                let best = Arc::clone(&best);
                scope.spawn(move |_| {
                    if best.load(Ordering::SeqCst) < horizon {
                        let _ = tx.send((horizon, WorkerReport::Skipped));
                        return;
                    }

                    let interrupt = Interrupt::new().with_shared_best(horizon, Arc::clone(&best));
                    let result = encoder.solve_horizon(horizon, interrupt);
                    if let Ok(HorizonAttempt {
                        outcome: HorizonOutcome::Plan(_),
                        ..
                    }) = &result
                    {
                        best.fetch_min(horizon, Ordering::SeqCst);
                    }
                    let _ = tx.send((horizon, WorkerReport::Finished(result)));
                });
            }
        });
        drop(tx);

        let mut reports: Vec<(usize, WorkerReport)> = rx.into_iter().collect();
        reports.sort_by_key(|(horizon, _)| *horizon);
        let best = best.load(Ordering::SeqCst);

        let mut unknown = Vec::new();
        for (horizon, report) in reports {
            // Anything above the winning horizon is discarded, whatever it says
            if horizon > best {
                break;
            }
            let attempt = match report {
                WorkerReport::Skipped => continue,
                WorkerReport::Finished(result) => result?,
            };
            self.attempts.push(attempt.statistics);

            match attempt.outcome {
                HorizonOutcome::Plan(trajectory) => {
                    Self::report_success(horizon, &unknown);
                    return Ok(trajectory);
                }
                HorizonOutcome::Unsatisfiable => debug!(horizon, "no plan of this length"),
                HorizonOutcome::Unknown => {
                    warn!(horizon, "solver gave up before deciding this horizon");
                    unknown.push(horizon);
                }
            }
        }

        Err(self.exhausted(&unknown))
    }

    fn report_success(horizon: usize, unknown: &[usize]) {
        if unknown.is_empty() {
            info!(horizon, "found minimum-length plan");
        } else {
            warn!(
                horizon,
                undecided = ?unknown,
                "found a plan, but shorter horizons were not decided so minimality is unproven"
            );
        }
    }

    fn exhausted(&self, unknown: &[usize]) -> PlanError {
        if unknown.is_empty() {
            info!(max_horizon = self.max_horizon, "no plan within the horizon bound");
            PlanError::NoSolution { bound: self.max_horizon }
        } else {
            PlanError::ResourceExhausted {
                reason: format!("solver did not decide horizons {:?}", unknown),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::world::{Cell, Direction, Level};

    fn settings(max_horizon: usize, parallel: bool) -> Settings {
        let mut settings = Settings::default();
        settings.planning.max_horizon = max_horizon;
        settings.solver.parallel = ParallelConfig {
            enabled: parallel,
            threads: 3,
        };
        settings
    }

    #[test]
    fn test_start_on_goal_returns_empty_plan() {
        let mut level = Level::parse("S.G\n").unwrap();
        level.goal = level.start;
        let mut driver = HorizonDriver::new(SatEncoder::new(settings(5, false), &level));

        let trajectory = driver.find_plan().unwrap();
        assert_eq!(trajectory.horizon(), 0);
        assert!(driver.attempts().is_empty());
    }

    #[test]
    fn test_sequential_finds_minimum_horizon() {
        let level = Level::parse("S.#\n.G.\n.#.\n").unwrap();
        let mut driver = HorizonDriver::new(SatEncoder::new(settings(6, false), &level));

        let trajectory = driver.find_plan().unwrap();
        assert_eq!(trajectory.moves, vec![Direction::Right, Direction::Down]);
        assert_eq!(driver.attempts().len(), 2);
    }

    #[test]
    fn test_parallel_agrees_with_sequential() {
        let level = Level::parse("S...#\n.B...\n...#.\n#...G\n").unwrap();

        let mut sequential = HorizonDriver::new(SatEncoder::new(settings(8, false), &level));
        let mut parallel = HorizonDriver::new(SatEncoder::new(settings(8, true), &level));

        let a = sequential.find_plan().unwrap();
        let b = parallel.find_plan().unwrap();
        assert_eq!(a.horizon(), b.horizon());
        assert_eq!(b.last().robot, level.goal);
        assert!(parallel.attempts().iter().all(|s| s.horizon <= b.horizon()));
    }

    #[test]
    fn test_unreachable_goal_is_no_solution() {
        // Open 3x3: the center is never a stopping point
        let level = Level::parse("S..\n.G.\n...\n").unwrap();
        for parallel in [false, true] {
            let mut driver = HorizonDriver::new(SatEncoder::new(settings(4, parallel), &level));
            assert_eq!(driver.find_plan().unwrap_err(), PlanError::NoSolution { bound: 4 });
        }
    }

    #[test]
    fn test_timeouts_reported_as_resource_exhaustion() {
        let level = Level::parse("S..\n.G.\n...\n").unwrap();
        let mut settings = settings(3, false);
        settings.solver.timeout_seconds = Some(0);
        let mut driver = HorizonDriver::new(SatEncoder::new(settings, &level));

        assert!(driver.find_plan().unwrap_err().is_resource_exhausted());
    }

    #[test]
    fn test_invalid_level_rejected() {
        let mut level = Level::parse("S.G\n").unwrap();
        level.boxes = vec![Cell::new(0, 0)];
        let mut driver = HorizonDriver::new(SatEncoder::new(settings(3, false), &level));
        assert!(matches!(driver.find_plan(), Err(PlanError::InvalidInput(_))));
    }
}

use crate::cli::Cli;
use crate::subject::Subject;
use anyhow::{Context, Result, ensure};
use centerout_core::{CURSOR, Environment, SphereEnvironment, State, TARGET, Trigger};
use centerout_task::{OutcomeSummary, SharedController, TaskConfig, TrialController};
use centerout_timing::{LatencyStats, ThreadTimer, TimerService, high_precision_sleep};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Turns per-frame overlap samples into engagement edges.
///
/// A new trial and every entry into a move state start disengaged, so a
/// cursor already resting on the target still produces `TargetEngaged`.
#[derive(Debug, Default)]
pub struct EngagementMonitor {
    trial: usize,
    state: State,
    engaged: bool,
}

impl EngagementMonitor {
    pub fn update(&mut self, trial: usize, state: State, engaged: bool) -> Option<Trigger> {
        let entered_move = state != self.state
            && matches!(state, State::MoveA | State::MoveB | State::MoveC);
        if trial != self.trial || entered_move {
            self.engaged = false;
        }
        self.trial = trial;
        self.state = state;
        let edge = match (self.engaged, engaged) {
            (false, true) => Some(Trigger::TargetEngaged),
            (true, false) => Some(Trigger::TargetDisengaged),
            _ => None,
        };
        self.engaged = engaged;
        edge
    }
}

/// Results of a finished block
#[derive(Debug)]
pub struct Report {
    pub summary: OutcomeSummary,
    pub timer_latency: LatencyStats,
    pub elapsed: Duration,
}

impl Report {
    pub fn print(&self) {
        println!("\nBlock completed in {:.2}s.", self.elapsed.as_secs_f64());
        println!(
            "Trials: {}  Successes: {}  Failures: {}  Success rate: {:.1}%",
            self.summary.total(),
            self.summary.successes,
            self.summary.failures,
            self.summary.success_rate() * 100.0
        );
        for (state, count) in &self.summary.failures_by_state {
            println!("  failed in {state}: {count}");
        }
        let l = &self.timer_latency;
        if l.samples > 0 {
            println!("Timer Latency Analysis:");
            println!("  Samples: {}", l.samples);
            println!("  Mean: {:.3}ms", l.mean_ns / 1_000_000.0);
            println!("  Jitter: {:.3}ms", l.jitter_ns / 1_000_000.0);
            println!(
                "  Range: {:.3}ms - {:.3}ms",
                l.min_ns / 1_000_000.0,
                l.max_ns / 1_000_000.0
            );
        }
    }
}

type Controller = SharedController<SphereEnvironment, ThreadTimer, StdRng>;

pub struct App {
    controller: Controller,
    timer: ThreadTimer,
    subject: Subject<StdRng>,
    monitor: EngagementMonitor,
    trials: usize,
    frame_period: Duration,
}

impl App {
    pub fn new(cli: &Cli) -> Result<Self> {
        ensure!(
            (0.0..=1.0).contains(&cli.lapse_rate),
            "lapse rate must be within [0, 1], got {}",
            cli.lapse_rate
        );
        ensure!(
            cli.frame_rate.is_finite() && cli.frame_rate > 0.0,
            "frame rate must be positive, got {}",
            cli.frame_rate
        );
        ensure!(
            cli.speed.is_finite() && cli.speed >= 0.0,
            "speed must be non-negative, got {}",
            cli.speed
        );

        let mut config = match &cli.config {
            Some(path) => TaskConfig::from_path(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => TaskConfig::default(),
        };
        if let Some(path) = &cli.targets {
            config.targets_path = Some(path.clone());
        }
        for entry in &cli.timeouts {
            config
                .apply_override(entry)
                .with_context(|| format!("invalid --timeout {entry}"))?;
        }

        let rng = |stream: u64| match cli.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
            None => StdRng::from_os_rng(),
        };

        let timer = ThreadTimer::new();
        let controller =
            TrialController::new(config, SphereEnvironment::new(), timer.clone(), rng(0))
                .context("invalid task configuration")?;
        info!(targets = controller.targets().len(), "task configured");

        Ok(Self {
            controller: SharedController::new(controller),
            timer,
            subject: Subject::new(cli.speed, cli.lapse_rate, rng(1)),
            monitor: EngagementMonitor::default(),
            trials: cli.trials,
            frame_period: Duration::from_secs_f64(1.0 / cli.frame_rate),
        })
    }

    pub fn run(mut self) -> Result<Report> {
        let start = Instant::now();
        self.controller
            .apply(Trigger::StartBlock)
            .context("failed to start block")?;

        let mut last = start;
        while self.completed() < self.trials {
            high_precision_sleep(self.frame_period);
            let now = Instant::now();
            self.update(now - last)?;
            last = now;
        }

        self.controller
            .apply(Trigger::EndBlock)
            .context("failed to end block")?;
        info!("block ended");

        let summary = OutcomeSummary::from_outcomes(self.controller.lock().outcomes());
        Ok(Report {
            summary,
            timer_latency: self.timer.latency_stats(),
            elapsed: start.elapsed(),
        })
    }

    fn completed(&self) -> usize {
        self.controller.lock().outcomes().len()
    }

    fn update(&mut self, dt: Duration) -> Result<()> {
        let mut controller = self.controller.lock();
        step_frame(&mut *controller, &mut self.subject, &mut self.monitor, dt)
    }
}

/// Moves the cursor one frame and feeds engagement edges to the controller.
fn step_frame<E, T, R, S>(
    controller: &mut TrialController<E, T, R>,
    subject: &mut Subject<S>,
    monitor: &mut EngagementMonitor,
    dt: Duration,
) -> Result<()>
where
    E: Environment,
    T: TimerService,
    R: Rng,
    S: Rng,
{
    let state = controller.state();
    let trial = controller.trial_number();

    let env = controller.environment_mut();
    let cursor = env.position(CURSOR)?;
    let target = if env.exists(TARGET) {
        Some(env.position(TARGET)?)
    } else {
        None
    };
    let next = subject.step(trial, state, cursor, target, dt);
    env.set_position(CURSOR, next)?;
    let engaged = target.is_some() && env.is_engaged(TARGET)?;

    if let Some(trigger) = monitor.update(trial, state, engaged) {
        debug!(%trigger, %state, "engagement edge");
        controller.apply(trigger)?;
    }
    Ok(())
}

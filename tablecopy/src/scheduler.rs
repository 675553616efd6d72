//! Daily trigger that runs a fixed list of steps once per day at a wall-clock time.
//!
//! The trigger is polled on an interval rather than armed with a timer, so a run starts within
//! one poll interval of the scheduled time. Runs missed while the process was down are not
//! caught up, and a run never overlaps the previous one because steps are awaited in order.

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{Days, Local, NaiveDateTime, NaiveTime};
use metrics::{counter, histogram};
use tablecopy_config::shared::ScheduleConfig;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{error, info, warn};

use crate::bail;
use crate::error::{ErrorKind, EtlError, EtlResult};
use crate::metrics::{
    OUTCOME_LABEL, STEP_LABEL, TABLECOPY_RUNS_TOTAL, TABLECOPY_STEP_DURATION_SECONDS,
    TABLECOPY_STEPS_TOTAL,
};
use crate::pipeline::PipelineReport;

/// A unit of work the scheduler runs, such as an export.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self) -> EtlResult<PipelineReport>;
}

/// Fires once per day at a fixed local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    at: NaiveTime,
}

impl DailySchedule {
    pub fn new(at: NaiveTime) -> Self {
        Self { at }
    }

    pub fn at(&self) -> NaiveTime {
        self.at
    }

    /// Returns the first scheduled time strictly after `now`.
    pub fn next_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date().and_time(self.at);
        if today > now {
            return today;
        }

        now.date()
            .checked_add_days(Days::new(1))
            .map(|tomorrow| tomorrow.and_time(self.at))
            .unwrap_or(NaiveDateTime::MAX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    Idle { next_run: NaiveDateTime },
    Running,
}

/// Tracks whether a scheduled run is due.
#[derive(Debug, Clone)]
pub struct Trigger {
    schedule: DailySchedule,
    state: TriggerState,
}

impl Trigger {
    /// Creates an idle trigger waiting for the first scheduled time after `now`.
    pub fn new(schedule: DailySchedule, now: NaiveDateTime) -> Self {
        Self {
            schedule,
            state: TriggerState::Idle {
                next_run: schedule.next_after(now),
            },
        }
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    /// Moves to [`TriggerState::Running`] and returns `true` when the next run is due.
    pub fn poll(&mut self, now: NaiveDateTime) -> bool {
        match self.state {
            TriggerState::Idle { next_run } if now >= next_run => {
                self.state = TriggerState::Running;
                true
            }
            _ => false,
        }
    }

    /// Finishes a run and waits for the next scheduled time after `now`.
    pub fn complete(&mut self, now: NaiveDateTime) {
        if self.state == TriggerState::Running {
            self.state = TriggerState::Idle {
                next_run: self.schedule.next_after(now),
            };
        }
    }
}

/// Runs every step in order.
///
/// Failed steps are logged. Unless `halt_on_failure` is set, the remaining steps still run and
/// all failures are returned together.
pub async fn run_cycle(steps: &[Box<dyn Step>], halt_on_failure: bool) -> EtlResult<()> {
    let mut errors: Vec<EtlError> = Vec::new();

    for step in steps {
        let start = Instant::now();
        info!(step = step.name(), "running step");

        let result = step.run().await;
        let duration = start.elapsed();
        histogram!(TABLECOPY_STEP_DURATION_SECONDS, STEP_LABEL => step.name())
            .record(duration.as_secs_f64());

        match result {
            Ok(report) => {
                counter!(
                    TABLECOPY_STEPS_TOTAL,
                    STEP_LABEL => step.name(),
                    OUTCOME_LABEL => "success"
                )
                .increment(1);
                info!(
                    step = step.name(),
                    table_count = report.tables.len(),
                    total_rows = report.total_rows(),
                    duration_secs = duration.as_secs(),
                    "step completed"
                );
            }
            Err(err) => {
                counter!(
                    TABLECOPY_STEPS_TOTAL,
                    STEP_LABEL => step.name(),
                    OUTCOME_LABEL => "failure"
                )
                .increment(1);
                error!(step = step.name(), %err, "step failed");
                errors.push(err);

                if halt_on_failure {
                    warn!("skipping remaining steps after failure");
                    break;
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.into())
    }
}

/// Polls a [`Trigger`] and runs its steps whenever it fires.
pub struct Scheduler {
    trigger: Trigger,
    poll_interval: Duration,
    halt_on_failure: bool,
    steps: Vec<Box<dyn Step>>,
}

impl Scheduler {
    pub fn new(
        trigger: Trigger,
        poll_interval: Duration,
        halt_on_failure: bool,
        steps: Vec<Box<dyn Step>>,
    ) -> Self {
        Self {
            trigger,
            poll_interval,
            halt_on_failure,
            steps,
        }
    }

    /// Builds a scheduler from configuration, starting from the current local time.
    pub fn from_config(config: &ScheduleConfig, steps: Vec<Box<dyn Step>>) -> EtlResult<Self> {
        let schedule = DailySchedule::new(config.time()?);
        let trigger = Trigger::new(schedule, local_now());

        Ok(Self::new(
            trigger,
            config.poll_interval(),
            config.halt_on_failure,
            steps,
        ))
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    /// Runs the steps if the trigger is due at `now`, returning `true` if a run happened.
    pub async fn tick(&mut self, now: NaiveDateTime) -> bool {
        if !self.trigger.poll(now) {
            return false;
        }

        info!(steps = self.steps.len(), "starting scheduled run");
        let start = Instant::now();

        match run_cycle(&self.steps, self.halt_on_failure).await {
            Ok(()) => info!(
                duration_secs = start.elapsed().as_secs(),
                "scheduled run completed"
            ),
            Err(err) => error!(%err, "scheduled run completed with failures"),
        }
        counter!(TABLECOPY_RUNS_TOTAL).increment(1);

        self.trigger.complete(local_now().max(now));
        if let TriggerState::Idle { next_run } = self.trigger.state() {
            info!(%next_run, "next run scheduled");
        }

        true
    }

    /// Polls until `shutdown` resolves.
    pub async fn run_until<F>(mut self, shutdown: F) -> EtlResult<()>
    where
        F: Future<Output = ()>,
    {
        if self.poll_interval.is_zero() {
            bail!(
                ErrorKind::ConfigError,
                "Scheduler poll interval must be greater than zero"
            );
        }

        if let TriggerState::Idle { next_run } = self.trigger.state() {
            info!(
                %next_run,
                poll_interval_secs = self.poll_interval.as_secs(),
                "waiting for scheduled run"
            );
        }

        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = interval.tick() => {
                    self.tick(local_now()).await;
                }
            }
        }

        info!("scheduler shutdown complete");
        Ok(())
    }

    /// Polls until the process receives SIGTERM or SIGINT.
    pub async fn run(self) -> EtlResult<()> {
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        let shutdown = async move {
            tokio::select! {
                _ = sigterm.recv() => info!("received SIGTERM, shutting down gracefully"),
                _ = sigint.recv() => info!("received SIGINT, shutting down gracefully"),
            }
        };

        self.run_until(shutdown).await
    }
}

/// Runs `steps` every day at the configured time until the process is signalled to stop.
pub async fn run_scheduler(config: &ScheduleConfig, steps: Vec<Box<dyn Step>>) -> EtlResult<()> {
    Scheduler::from_config(config, steps)?.run().await
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

//! # Real-Time Scheduler
//!
//! Paces a [`CPU`] against a host clock. Each poll interval (a "jiffy") the
//! scheduler grants a budget of `speed_mhz * 1e6 * poll_interval` cycles and
//! steps the CPU until the budget is spent or `proceed` is cleared.
//!
//! If the host falls behind, every whole missed interval adds another
//! interval's worth of cycles to the next grant. Overshoot from the last
//! instruction of a burst carries into the next one, so the long-run rate
//! matches the configured speed.
//!
//! ```text
//! Idle --start--> Running --proceed cleared / fatal error--> Finished
//! ```
//!
//! Time comes from a [`TimeSource`]; tests drive a [`ManualClock`].

use std::cell::Cell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use log::{error, info};

use crate::{ExecutionError, MemoryBus, CPU};

/// Monotonic time and sleeping, as seen by the scheduler.
pub trait TimeSource {
    /// Time since an arbitrary fixed origin.
    fn now(&self) -> Duration;

    fn sleep(&self, duration: Duration);
}

/// Host wall clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Deterministic clock that only moves when told to. Sleeping advances it.
///
/// Clones share the same time, so a test can keep a handle while the
/// scheduler owns another.
///
/// ```
/// use std::time::Duration;
/// use sim6502::{ManualClock, TimeSource};
///
/// let clock = ManualClock::new();
/// let handle = clock.clone();
/// handle.advance(Duration::from_millis(25));
/// assert_eq!(clock.now(), Duration::from_millis(25));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }

    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// Emulated speed and poll interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacingConfig {
    pub speed_mhz: f64,
    pub poll_interval: Duration,
}

impl PacingConfig {
    pub fn new(speed_mhz: f64, poll_interval: Duration) -> Self {
        Self {
            speed_mhz,
            poll_interval,
        }
    }

    /// Cycles granted per poll interval.
    ///
    /// ```
    /// use std::time::Duration;
    /// use sim6502::PacingConfig;
    ///
    /// let pacing = PacingConfig::new(1.0, Duration::from_millis(10));
    /// assert_eq!(pacing.cycles_per_interval(), 10_000);
    /// ```
    pub fn cycles_per_interval(&self) -> u64 {
        (self.speed_mhz * 1_000_000.0 * self.poll_interval.as_secs_f64()).round() as u64
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self::new(2.0, Duration::from_millis(10))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Finished,
}

/// Outcome of one poll interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Cycle grant for this tick, including catch-up for missed intervals.
    pub allowed_cycles: u64,
    pub executed_cycles: u64,
    pub finished: bool,
}

/// Timing statistics for a completed run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub cycles: u64,
    pub jiffies: u64,
    /// Host time from start to finish.
    pub elapsed: Duration,
    /// Host time spent inside instruction bursts.
    pub executing_time: Duration,
}

impl RunSummary {
    /// Emulated cycles per host second, in MHz.
    pub fn effective_speed_mhz(&self) -> f64 {
        let seconds = self.elapsed.as_secs_f64();
        if seconds == 0.0 {
            return 0.0;
        }
        self.cycles as f64 / seconds / 1_000_000.0
    }
}

pub struct Scheduler<T: TimeSource = SystemClock> {
    clock: T,
    pacing: PacingConfig,
    cycles_per_interval: u64,
    state: SchedulerState,
    start_time: Duration,
    finish_time: Option<Duration>,
    jiffies: u64,
    interval_cycles: i64,
    executing_time: Duration,
    start_cycles: u64,
}

impl<T: TimeSource> Scheduler<T> {
    /// Creates an idle scheduler. Poll intervals shorter than a millisecond are
    /// raised to one millisecond, and every interval grants at least one cycle.
    pub fn new(mut pacing: PacingConfig, clock: T) -> Self {
        pacing.poll_interval = pacing.poll_interval.max(Duration::from_millis(1));
        Self {
            clock,
            cycles_per_interval: pacing.cycles_per_interval().max(1),
            pacing,
            state: SchedulerState::Idle,
            start_time: Duration::ZERO,
            finish_time: None,
            jiffies: 0,
            interval_cycles: 0,
            executing_time: Duration::ZERO,
            start_cycles: 0,
        }
    }

    /// Moves Idle to Running, records the start time and notifies `starting`.
    /// Does nothing in any other state.
    pub fn start<M: MemoryBus>(&mut self, cpu: &mut CPU<M>) {
        if self.state != SchedulerState::Idle {
            return;
        }
        self.state = SchedulerState::Running;
        self.start_time = self.clock.now();
        self.start_cycles = cpu.cycles();
        info!(
            "starting {} at {} MHz, {} cycles per {:?} interval",
            cpu.level(),
            self.pacing.speed_mhz,
            self.cycles_per_interval,
            self.pacing.poll_interval
        );
        cpu.observers_mut().starting();
    }

    /// Runs one poll interval's worth of instructions.
    ///
    /// # Errors
    ///
    /// A fatal [`ExecutionError`] finishes the scheduler and is returned.
    pub fn tick<M: MemoryBus>(&mut self, cpu: &mut CPU<M>) -> Result<TickReport, ExecutionError> {
        match self.state {
            SchedulerState::Finished => {
                return Ok(TickReport {
                    allowed_cycles: 0,
                    executed_cycles: 0,
                    finished: true,
                })
            }
            SchedulerState::Idle => self.start(cpu),
            SchedulerState::Running => {}
        }
        cpu.observers_mut().polling();

        let cycles_per_interval = self.cycles_per_interval as i64;
        let calculated = self.jiffy_offset(self.jiffies);
        let actual = self.clock.now().saturating_sub(self.start_time);
        self.jiffies += 1;

        let mut allowed = cycles_per_interval;
        if actual > calculated {
            let missed = (actual - calculated).as_nanos() / self.pacing.poll_interval.as_nanos();
            allowed += missed as i64 * cycles_per_interval;
        }

        let burst_start = self.clock.now();
        let mut executed = 0;
        while cpu.proceed() && self.interval_cycles < allowed {
            let before = cpu.cycles();
            if let Err(e) = cpu.step() {
                error!("{e}");
                self.finish(cpu);
                return Err(e);
            }
            let delta = cpu.cycles() - before;
            self.interval_cycles += delta as i64;
            executed += delta;
        }
        self.executing_time += self.clock.now().saturating_sub(burst_start);
        self.interval_cycles -= cycles_per_interval;

        if !cpu.proceed() {
            self.finish(cpu);
        }

        Ok(TickReport {
            allowed_cycles: allowed as u64,
            executed_cycles: executed,
            finished: self.state == SchedulerState::Finished,
        })
    }

    /// Starts if needed, then ticks until finished, sleeping between ticks
    /// until the next interval boundary.
    pub fn run<M: MemoryBus>(&mut self, cpu: &mut CPU<M>) -> Result<RunSummary, ExecutionError> {
        self.run_with(cpu, |_| {})
    }

    /// Like [`run`](Self::run), calling `between_ticks` before every tick.
    /// This is where host-side work such as keyboard input reaches the CPU;
    /// clearing `proceed` there ends the run at the following tick.
    pub fn run_with<M, F>(&mut self, cpu: &mut CPU<M>, mut between_ticks: F) -> Result<RunSummary, ExecutionError>
    where
        M: MemoryBus,
        F: FnMut(&mut CPU<M>),
    {
        self.start(cpu);
        loop {
            between_ticks(cpu);
            if self.tick(cpu)?.finished {
                break;
            }
            let deadline = self.start_time + self.jiffy_offset(self.jiffies);
            let now = self.clock.now();
            if deadline > now {
                self.clock.sleep(deadline - now);
            }
        }
        Ok(self.summary(cpu))
    }

    fn finish<M: MemoryBus>(&mut self, cpu: &mut CPU<M>) {
        if self.state == SchedulerState::Finished {
            return;
        }
        self.state = SchedulerState::Finished;
        self.finish_time = Some(self.clock.now());
        cpu.observers_mut().finished();

        let summary = self.summary(cpu);
        info!(
            "finished after {} cycles in {:?} ({:?} executing, {:.3} MHz effective)",
            summary.cycles,
            summary.elapsed,
            summary.executing_time,
            summary.effective_speed_mhz()
        );
    }

    /// Time of the start of interval `jiffies`, relative to the start time.
    fn jiffy_offset(&self, jiffies: u64) -> Duration {
        Duration::from_nanos(self.pacing.poll_interval.as_nanos() as u64 * jiffies)
    }

    pub fn summary<M: MemoryBus>(&self, cpu: &CPU<M>) -> RunSummary {
        RunSummary {
            cycles: cpu.cycles() - self.start_cycles,
            jiffies: self.jiffies,
            elapsed: self.elapsed(),
            executing_time: self.executing_time,
        }
    }

    /// Host time since start; frozen once finished.
    pub fn elapsed(&self) -> Duration {
        match self.state {
            SchedulerState::Idle => Duration::ZERO,
            SchedulerState::Running => self.clock.now().saturating_sub(self.start_time),
            SchedulerState::Finished => self
                .finish_time
                .unwrap_or(self.start_time)
                .saturating_sub(self.start_time),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn jiffies(&self) -> u64 {
        self.jiffies
    }

    pub fn cycles_per_interval(&self) -> u64 {
        self.cycles_per_interval
    }

    pub fn pacing(&self) -> PacingConfig {
        self.pacing
    }

    pub fn executing_time(&self) -> Duration {
        self.executing_time
    }

    pub fn clock(&self) -> &T {
        &self.clock
    }
}

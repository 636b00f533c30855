//! Polling main loop.
//!
//! The controller owns the dispatcher and the input port. Once per poll
//! interval it takes at most one line from the port, decodes it, runs the
//! resulting command to completion and echoes an operator summary. Decode
//! errors and actuator faults are reported and the loop keeps polling; only
//! an I/O failure of the port or the echo sink, the running flag, or a
//! closed port ends [`Controller::run`].
//!
//! # Echo format
//!
//! ```text
//! Case: 8
//! Recalibrating: rotation
//!
//! Command received: 8207
//! Movement request:
//! - Motor: rotation
//! - Movement: 207
//! - Calibration: rotation find range
//!
//! Select motor and movement...
//! ```

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use boccia_common::config::ControllerConfig;
use boccia_common::consts::READY_PROMPT;
use boccia_common::protocol::{self, Command, DecodeError};

use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::error::RigError;
use crate::interrupts::{InterruptLines, arm_limit_interrupts};
use crate::port::{InputPort, PortPoll};

/// What one poll did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollResult {
    /// No line was available, or the line was blank.
    Idle,
    /// A line was handled.
    Handled(DispatchOutcome),
    /// The port is exhausted.
    Closed,
}

/// Counters kept by the main loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopStats {
    pub polls: u64,
    pub completed: u64,
    pub faulted: u64,
    pub rejected: u64,
}

impl LoopStats {
    fn record(&mut self, outcome: &DispatchOutcome) {
        match outcome {
            DispatchOutcome::Completed { .. } => self.completed += 1,
            DispatchOutcome::Faulted { .. } => self.faulted += 1,
            DispatchOutcome::Rejected(_) => self.rejected += 1,
        }
    }
}

/// Rig controller main loop.
pub struct Controller<P, W> {
    dispatcher: Dispatcher,
    lines: Arc<InterruptLines>,
    port: P,
    echo: W,
    poll_interval: Duration,
    echo_prompt: bool,
    running: Arc<AtomicBool>,
    stats: LoopStats,
}

impl<P: InputPort, W: Write> Controller<P, W> {
    pub fn new(
        dispatcher: Dispatcher,
        lines: Arc<InterruptLines>,
        port: P,
        echo: W,
        config: &ControllerConfig,
    ) -> Self {
        Self {
            dispatcher,
            lines,
            port,
            echo,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            echo_prompt: config.echo_prompt,
            running: Arc::new(AtomicBool::new(true)),
            stats: LoopStats::default(),
        }
    }

    /// Flag cleared to stop [`run`](Self::run) from another thread.
    ///
    /// Set from construction, so a stop requested before `run` holds.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn echo(&self) -> &W {
        &self.echo
    }

    pub fn into_echo(self) -> W {
        self.echo
    }

    /// Quiesce sensors, attach limit interrupts and print the ready prompt.
    pub fn startup(&mut self) -> Result<(), RigError> {
        writeln!(self.echo, "Begin setup")?;
        arm_limit_interrupts(self.dispatcher.rig_mut(), &self.lines)?;
        self.prompt()?;
        info!("Rig ready: {:?}", self.dispatcher.rig());
        Ok(())
    }

    /// Decode and run one input line.
    ///
    /// Returns `None` for a blank line.
    pub fn handle_line(&mut self, line: &str) -> Result<Option<DispatchOutcome>, RigError> {
        if line.trim().is_empty() {
            return Ok(None);
        }

        let raw = match Command::parse_line(line) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("{e}");
                writeln!(self.echo, "Incorrect command: {}", line.trim())?;
                self.prompt()?;
                return Ok(Some(self.finish(DispatchOutcome::Rejected(e))));
            }
        };

        let (device, payload) = match protocol::decode(raw) {
            Ok(decoded) => decoded,
            Err(e) => {
                if let DecodeError::UnknownDevice(code) = e {
                    writeln!(self.echo, "Case: {code}")?;
                }
                warn!("Command {raw}: {e}");
                writeln!(self.echo, "Incorrect command: {raw}")?;
                self.prompt()?;
                return Ok(Some(self.finish(DispatchOutcome::Rejected(e))));
            }
        };

        writeln!(self.echo, "Case: {}", device.code())?;
        let command = match Command::from_parts(device, payload) {
            Ok(command) => command,
            Err(e) => {
                if let DecodeError::UnknownCalibrationSelector(code) = e {
                    writeln!(self.echo, "Incorrect command to calibrate: {code}")?;
                }
                warn!("Command {raw}: {e}");
                self.prompt()?;
                return Ok(Some(self.finish(DispatchOutcome::Rejected(e))));
            }
        };

        if let Command::Calibration { selector, .. } = command {
            writeln!(self.echo, "Recalibrating: {}", selector.subject())?;
        }
        debug!("Command {raw} decoded as {command:?}");

        let outcome = self.dispatcher.execute(command);
        self.echo_summary(raw, payload, &command, &outcome)?;
        Ok(Some(self.finish(outcome)))
    }

    /// Poll the port once and handle at most one line.
    pub fn poll_once(&mut self) -> Result<PollResult, RigError> {
        self.stats.polls += 1;
        match self.port.poll_line()? {
            PortPoll::Line(line) => Ok(match self.handle_line(&line)? {
                Some(outcome) => PollResult::Handled(outcome),
                None => PollResult::Idle,
            }),
            PortPoll::Idle => Ok(PollResult::Idle),
            PortPoll::Closed => Ok(PollResult::Closed),
        }
    }

    /// Poll until the running flag is cleared or the port closes.
    pub fn run(&mut self) -> Result<LoopStats, RigError> {
        info!(
            "Starting main loop (poll_interval={}ms)",
            self.poll_interval.as_millis()
        );
        while self.running.load(Ordering::SeqCst) {
            let poll_start = Instant::now();
            if self.poll_once()? == PollResult::Closed {
                info!("Input port closed");
                break;
            }

            let elapsed = poll_start.elapsed();
            if elapsed < self.poll_interval {
                std::thread::sleep(self.poll_interval - elapsed);
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!(
            "Main loop stopped: {} completed, {} faulted, {} rejected",
            self.stats.completed, self.stats.faulted, self.stats.rejected
        );
        Ok(self.stats)
    }

    fn finish(&mut self, outcome: DispatchOutcome) -> DispatchOutcome {
        self.stats.record(&outcome);
        outcome
    }

    fn echo_summary(
        &mut self,
        raw: i32,
        payload: i32,
        command: &Command,
        outcome: &DispatchOutcome,
    ) -> std::io::Result<()> {
        let motor = match command {
            Command::Calibration { selector, .. } => selector.subject(),
            Command::Primary { device, .. } => device.name(),
        };

        writeln!(self.echo)?;
        writeln!(self.echo, "Command received: {raw}")?;
        writeln!(self.echo, "Movement request:")?;
        writeln!(self.echo, "- Motor: {motor}")?;
        writeln!(self.echo, "- Movement: {payload}")?;
        if let Command::Calibration { selector, .. } = command {
            writeln!(self.echo, "- Calibration: {}", selector.describe())?;
        }
        if let DispatchOutcome::Faulted {
            operation, error, ..
        } = outcome
        {
            writeln!(self.echo, "- Fault: {operation}: {error}")?;
        }
        self.prompt()
    }

    fn prompt(&mut self) -> std::io::Result<()> {
        if self.echo_prompt {
            writeln!(self.echo)?;
            writeln!(self.echo, "{READY_PROMPT}")?;
        }
        self.echo.flush()
    }
}

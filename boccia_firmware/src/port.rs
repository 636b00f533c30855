//! Line-oriented command input.
//!
//! The controller polls an [`InputPort`] once per loop iteration and never
//! blocks on it. [`ChannelPort`] turns any byte stream (stdin, a serial
//! device node, a file) into complete lines on a reader thread;
//! [`ScriptedPort`] replays a fixed list of lines for tests and demos.

use std::collections::VecDeque;
use std::io::{self, Read};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use heapless::Vec;
use tracing::{debug, warn};

use boccia_common::consts::MAX_LINE_LEN;

/// Result of one non-blocking poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortPoll {
    /// A complete line, without its terminator.
    Line(String),
    /// Nothing available yet.
    Idle,
    /// The input source is exhausted.
    Closed,
}

/// Non-blocking source of command lines.
pub trait InputPort {
    fn poll_line(&mut self) -> io::Result<PortPoll>;
}

/// Fixed-capacity assembler of terminator-delimited lines.
///
/// `\n` and `\r` both end a line. A line longer than `MAX_LINE_LEN` bytes is
/// dropped as a whole.
#[derive(Debug, Default)]
pub struct LineAssembler {
    buf: Vec<u8, MAX_LINE_LEN>,
    overflowed: bool,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte. Returns a line when `byte` terminates a non-empty one.
    pub fn push(&mut self, byte: u8) -> Option<String> {
        match byte {
            b'\n' | b'\r' => self.take(),
            _ => {
                if !self.overflowed && self.buf.push(byte).is_err() {
                    self.overflowed = true;
                }
                None
            }
        }
    }

    /// Flush a trailing unterminated line at end of input.
    pub fn finish(&mut self) -> Option<String> {
        self.take()
    }

    fn take(&mut self) -> Option<String> {
        let line = if self.overflowed {
            warn!("Dropping command line longer than {MAX_LINE_LEN} bytes");
            None
        } else if self.buf.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&self.buf).into_owned())
        };
        self.buf.clear();
        self.overflowed = false;
        line
    }
}

/// Port fed by a reader thread.
pub struct ChannelPort {
    rx: Receiver<String>,
    reader: Option<JoinHandle<()>>,
}

impl ChannelPort {
    /// Start a reader thread assembling lines from `source`.
    ///
    /// The port reports [`PortPoll::Closed`] once the source hits end of
    /// input or fails and every assembled line has been polled.
    pub fn spawn<R>(source: R) -> io::Result<Self>
    where
        R: Read + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let reader = thread::Builder::new()
            .name("boccia-port".to_string())
            .spawn(move || {
                let mut assembler = LineAssembler::new();
                for byte in source.bytes() {
                    let byte = match byte {
                        Ok(b) => b,
                        Err(e) => {
                            warn!("Input port read failed: {e}");
                            break;
                        }
                    };
                    if let Some(line) = assembler.push(byte) {
                        if tx.send(line).is_err() {
                            return;
                        }
                    }
                }
                if let Some(line) = assembler.finish() {
                    let _ = tx.send(line);
                }
                debug!("Input port reached end of input");
            })?;
        Ok(Self {
            rx,
            reader: Some(reader),
        })
    }
}

impl InputPort for ChannelPort {
    fn poll_line(&mut self) -> io::Result<PortPoll> {
        match self.rx.try_recv() {
            Ok(line) => Ok(PortPoll::Line(line)),
            Err(TryRecvError::Empty) => Ok(PortPoll::Idle),
            Err(TryRecvError::Disconnected) => {
                if let Some(reader) = self.reader.take() {
                    if reader.join().is_err() {
                        return Err(io::Error::other("input reader thread panicked"));
                    }
                }
                Ok(PortPoll::Closed)
            }
        }
    }
}

/// Port replaying a fixed list of lines.
#[derive(Debug, Default)]
pub struct ScriptedPort {
    lines: VecDeque<PortPoll>,
}

impl ScriptedPort {
    /// Every line is delivered on its own poll; the port closes afterwards.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(|l| PortPoll::Line(l.into())).collect(),
        }
    }

    /// Append `polls` idle polls after everything already scripted.
    pub fn idle(mut self, polls: usize) -> Self {
        self.lines.extend(std::iter::repeat_n(PortPoll::Idle, polls));
        self
    }

    /// Append a line after everything already scripted.
    pub fn then(mut self, line: impl Into<String>) -> Self {
        self.lines.push_back(PortPoll::Line(line.into()));
        self
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl InputPort for ScriptedPort {
    fn poll_line(&mut self) -> io::Result<PortPoll> {
        Ok(self.lines.pop_front().unwrap_or(PortPoll::Closed))
    }
}

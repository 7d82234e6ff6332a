//! Per-process tailer for the wrapper's failure event log.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

use super::event::FailureEvent;
use super::gate::{SyncMonitor, WaitHandle};

/// How often a tailer blocked on a full channel re-checks the gate.
const SEND_RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Outcome of one read attempt.
#[derive(Debug, PartialEq, Eq)]
enum ReadOutcome {
    /// A newline-terminated record, including any bytes buffered earlier
    Record(Vec<u8>),
    /// No complete record yet; partial bytes (if any) stay buffered
    Pending,
}

/// Streams one event log and publishes decoded failures.
///
/// Read position and any partial record survive gate stop/start; the log is
/// never reopened or rewound.
pub struct EventTailer {
    name: String,
    path: PathBuf,
    reader: BufReader<File>,
    partial: Vec<u8>,
    handle: WaitHandle,
    sender: SyncSender<FailureEvent>,
    backoff: Duration,
}

impl EventTailer {
    /// Open `path` for reading and register with `monitor`.
    pub fn open(
        name: &str,
        path: &Path,
        monitor: &SyncMonitor,
        sender: SyncSender<FailureEvent>,
        backoff: Duration,
    ) -> Result<Self> {
        let file = File::open(path).with_context(|| {
            format!("Opening service wrapper JSON event log: {}", path.display())
        })?;

        Ok(Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            partial: Vec::new(),
            handle: monitor.register(),
            sender,
            backoff,
        })
    }

    /// Gate handle id; pass it to [`SyncMonitor::retire`] to stop this
    /// tailer alone.
    pub fn id(&self) -> u64 {
        self.handle.id()
    }

    /// Run the tailer on its own thread.
    pub fn spawn(self) -> Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("tail-{}", self.name))
            .spawn(move || self.run())
            .context("Failed to spawn event log tailer thread")
    }

    /// Tail until the gate exits, the handle is retired or the channel's
    /// receiver is gone.
    pub fn run(mut self) {
        debug!(process = %self.name, log = %self.path.display(), "Tailing service event log");

        while self.handle.wait() {
            let proceed = match self.read_record() {
                Ok(ReadOutcome::Record(record)) => match decode_record(&record) {
                    Some(Ok(event)) => self.publish(event),
                    Some(Err(e)) => {
                        debug!(process = %self.name, "Unmarshaling service event JSON: {e}");
                        true
                    }
                    None => true,
                },
                Ok(ReadOutcome::Pending) => self.handle.pause(self.backoff),
                Err(e) => {
                    debug!(
                        "Unhandled error reading service event log file ({}): {e}",
                        self.path.display()
                    );
                    self.handle.pause(self.backoff)
                }
            };
            if !proceed {
                break;
            }
        }

        debug!(process = %self.name, "Stopped tailing service event log");
    }

    fn read_record(&mut self) -> std::io::Result<ReadOutcome> {
        self.reader.read_until(b'\n', &mut self.partial)?;
        if self.partial.last() == Some(&b'\n') {
            return Ok(ReadOutcome::Record(std::mem::take(&mut self.partial)));
        }
        Ok(ReadOutcome::Pending)
    }

    /// Block until the event is queued. Returns `false` when the tailer
    /// should terminate instead.
    ///
    /// A stopped gate parks the retry loop until `start`.
    fn publish(&self, mut event: FailureEvent) -> bool {
        loop {
            if !self.handle.wait() {
                return false;
            }
            match self.sender.try_send(event) {
                Ok(()) => return true,
                Err(TrySendError::Full(returned)) => {
                    if !self.handle.pause(SEND_RETRY_INTERVAL) {
                        return false;
                    }
                    event = returned;
                }
                Err(TrySendError::Disconnected(_)) => return false,
            }
        }
    }
}

/// Decode one complete record; blank lines yield `None`.
pub fn decode_record(record: &[u8]) -> Option<serde_json::Result<FailureEvent>> {
    if record.trim_ascii().is_empty() {
        return None;
    }
    Some(FailureEvent::decode(record))
}

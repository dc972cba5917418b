use tracing::info;

use crate::classify::Outcome;

/// Events emitted by the batch processor while it works through records.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Started {
        planned: usize,
        cursor_serial: Option<u32>,
    },
    RecordStarted {
        serial_number: u32,
        position: usize,
        planned: usize,
    },
    /// Record had no profile to visit and was marked processed as-is.
    RecordSkipped { serial_number: u32 },
    RecordCommitted {
        serial_number: u32,
        outcome: Outcome,
    },
    Interrupted { attempted: usize },
    Finished { successful: usize, attempted: usize },
}

pub trait ProgressReporter {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Human-readable progress lines for the CLI.
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Started {
                planned,
                cursor_serial,
            } => match cursor_serial {
                Some(serial) => info!(planned, start = serial, "Starting batch"),
                None => info!("Nothing left to process"),
            },
            ProgressEvent::RecordStarted {
                serial_number,
                position,
                planned,
            } => info!(serial = serial_number, "Processing {}/{}", position, planned),
            ProgressEvent::RecordSkipped { serial_number } => {
                info!(serial = serial_number, "No profile link, marked processed")
            }
            ProgressEvent::RecordCommitted {
                serial_number,
                outcome,
            } => info!(serial = serial_number, outcome = %outcome, "Saved"),
            ProgressEvent::Interrupted { attempted } => {
                info!(attempted, "Batch interrupted; progress saved")
            }
            ProgressEvent::Finished {
                successful,
                attempted,
            } => info!("Batch finished: {}/{} requests sent", successful, attempted),
        }
    }
}

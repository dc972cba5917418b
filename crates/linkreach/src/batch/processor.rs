use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use super::cancel::CancelFlag;
use super::pacing::Pacing;
use super::plan::{plan_batch, PlanStep};
use super::progress::{ProgressEvent, ProgressReporter};
use crate::classify::{Classifier, Outcome};
use crate::config::Config;
use crate::driver::UiDriver;
use crate::error::StoreError;
use crate::sanitize::{profile_slug, redact_path};
use crate::store::{RecordSet, RecordStore};

/// Longest single wait while pacing, so an interrupt is noticed promptly.
const PACING_SLICE: Duration = Duration::from_millis(500);

/// Vertical position the profile page is scrolled to before classifying.
const PROFILE_SCROLL_FRACTION: f64 = 1.0 / 3.0;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Profiles visited.
    pub attempted: usize,
    /// Visits that produced a new connection request.
    pub successful: usize,
    /// Targetless records marked processed on the way.
    pub skipped: usize,
    pub interrupted: bool,
    pub by_outcome: BTreeMap<Outcome, usize>,
}

impl BatchSummary {
    fn record(&mut self, outcome: Outcome) {
        self.attempted += 1;
        if outcome.is_success() {
            self.successful += 1;
        }
        *self.by_outcome.entry(outcome).or_insert(0) += 1;
    }
}

/// Works through the next batch of records, committing each one to the
/// store before moving on.
pub struct BatchProcessor {
    classifier: Classifier,
    pacing: Pacing,
    page_settle: Duration,
    cancel: CancelFlag,
}

impl BatchProcessor {
    pub fn from_config(config: &Config, cancel: CancelFlag) -> Self {
        Self {
            classifier: Classifier::from_config(&config.profile),
            pacing: Pacing::from_config(&config.batch),
            page_settle: config.batch.page_settle(),
            cancel,
        }
    }

    /// Create with explicit components (for testing).
    pub fn new(
        classifier: Classifier,
        pacing: Pacing,
        page_settle: Duration,
        cancel: CancelFlag,
    ) -> Self {
        Self {
            classifier,
            pacing,
            page_settle,
            cancel,
        }
    }

    /// Processes up to `requested` actionable records from the cursor on.
    ///
    /// Every record is marked processed and the whole set saved before the
    /// next one starts, so an interrupted run resumes exactly where it
    /// stopped. Only store failures abort the batch.
    pub fn run(
        &self,
        driver: &mut dyn UiDriver,
        records: &mut RecordSet,
        store: &dyn RecordStore,
        requested: usize,
        progress: &dyn ProgressReporter,
    ) -> Result<BatchSummary, StoreError> {
        let run_id = uuid::Uuid::new_v4();
        let _span = info_span!(
            "batch",
            run_id = %run_id,
            store = %redact_path(store.location()),
            requested
        )
        .entered();

        let plan = plan_batch(records, requested);
        progress.report(ProgressEvent::Started {
            planned: plan.visits,
            cursor_serial: plan.cursor_serial,
        });

        let mut summary = BatchSummary::default();
        if plan.is_empty() {
            info!("Nothing left to process");
            progress.report(ProgressEvent::Finished {
                successful: 0,
                attempted: 0,
            });
            return Ok(summary);
        }

        let mut visits_left = plan.visits;
        for step in &plan.steps {
            if self.cancel.is_cancelled() {
                summary.interrupted = true;
                break;
            }

            match step {
                PlanStep::Skip { serial_number } => {
                    records.mark_processed(*serial_number, None)?;
                    records.save(store)?;
                    summary.skipped += 1;
                    progress.report(ProgressEvent::RecordSkipped {
                        serial_number: *serial_number,
                    });
                }
                PlanStep::Visit {
                    serial_number,
                    target,
                } => {
                    progress.report(ProgressEvent::RecordStarted {
                        serial_number: *serial_number,
                        position: summary.attempted + 1,
                        planned: plan.visits,
                    });

                    let outcome = self.visit(driver, *serial_number, target);
                    records.mark_processed(*serial_number, Some(outcome))?;
                    records.save(store)?;
                    summary.record(outcome);
                    visits_left -= 1;
                    progress.report(ProgressEvent::RecordCommitted {
                        serial_number: *serial_number,
                        outcome,
                    });

                    if visits_left > 0 {
                        self.pace(driver);
                    }
                }
            }
        }

        if summary.interrupted {
            warn!(attempted = summary.attempted, "Batch interrupted");
            records.save(store)?;
            progress.report(ProgressEvent::Interrupted {
                attempted: summary.attempted,
            });
        }

        info!(
            successful = summary.successful,
            attempted = summary.attempted,
            skipped = summary.skipped,
            "Batch complete"
        );
        progress.report(ProgressEvent::Finished {
            successful: summary.successful,
            attempted: summary.attempted,
        });
        Ok(summary)
    }

    fn visit(&self, driver: &mut dyn UiDriver, serial_number: u32, target: &str) -> Outcome {
        let _span = info_span!(
            "record",
            serial = serial_number,
            profile = %profile_slug(target)
        )
        .entered();

        if let Err(e) = driver.navigate(target) {
            warn!(error = %e, "Could not open profile");
            return Outcome::ActionFailed;
        }
        driver.pause(self.page_settle);
        if let Err(e) = driver.scroll_to_fraction(PROFILE_SCROLL_FRACTION) {
            debug!(error = %e, "Could not scroll profile page");
        }

        self.classifier.classify(driver)
    }

    fn pace(&self, driver: &mut dyn UiDriver) {
        let mut remaining = self.pacing.next_delay();
        debug!(delay_ms = remaining.as_millis() as u64, "Waiting before next profile");
        while !remaining.is_zero() {
            if self.cancel.is_cancelled() {
                return;
            }
            let slice = remaining.min(PACING_SLICE);
            driver.pause(slice);
            remaining -= slice;
        }
    }
}

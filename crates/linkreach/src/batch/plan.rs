use crate::store::RecordSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanStep {
    /// No profile to visit; marked processed without a status.
    Skip { serial_number: u32 },
    Visit { serial_number: u32, target: String },
}

impl PlanStep {
    pub fn serial_number(&self) -> u32 {
        match self {
            PlanStep::Skip { serial_number } | PlanStep::Visit { serial_number, .. } => {
                *serial_number
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    pub steps: Vec<PlanStep>,
    /// Serial of the first unprocessed record when the plan was made.
    pub cursor_serial: Option<u32>,
    /// Number of profiles that will be visited.
    pub visits: usize,
}

impl BatchPlan {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Selects the next batch.
///
/// Starting at the first unprocessed record and moving strictly in store
/// order, takes up to `requested` records that have a profile to visit
/// (clamped to how many remain). Targetless records met on the way are
/// included as skips and do not count toward the size, including the ones
/// directly after the last visit, so the cursor never parks on a record
/// that can never be visited.
pub fn plan_batch(records: &RecordSet, requested: usize) -> BatchPlan {
    let limit = requested.min(records.actionable_remaining());
    let cursor_serial = records
        .cursor()
        .map(|index| records.records()[index].serial_number);

    let mut steps = Vec::new();
    let mut visits = 0;
    if requested > 0 {
        for record in records.pending_from_cursor() {
            match record.action_target() {
                Some(_) if visits == limit => break,
                Some(target) => {
                    steps.push(PlanStep::Visit {
                        serial_number: record.serial_number,
                        target: target.to_string(),
                    });
                    visits += 1;
                }
                None => steps.push(PlanStep::Skip {
                    serial_number: record.serial_number,
                }),
            }
        }
    }

    BatchPlan {
        steps,
        cursor_serial,
        visits,
    }
}

//! Typed outcomes for pipeline steps.
//!
//! The partial-failure policy of the pipeline is encoded here instead
//! of in catch-all error handling: a best-effort step yields
//! [`StepOutcome`], a fatal step propagates an error, and the job as a
//! whole yields a [`FulfillmentReport`].

use common::OrderId;

/// Best-effort step names as they appear in logs, metrics, and
/// reports. The fatal steps never skip, so they carry no name here.
pub const STEP_NOTIFY: &str = "notify";
pub const STEP_INVOICE: &str = "invoice";
pub const STEP_CLEAR_CART: &str = "clear_cart";

/// Outcome of one best-effort pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step ran to completion.
    Completed,
    /// The step failed or was not applicable; the pipeline continued.
    Skipped(SkippedStep),
}

impl StepOutcome {
    /// Builds a skipped outcome.
    pub fn skipped(step: &'static str, reason: impl Into<String>) -> Self {
        StepOutcome::Skipped(SkippedStep {
            step,
            reason: reason.into(),
        })
    }

    /// Returns true if the step completed.
    pub fn is_completed(&self) -> bool {
        matches!(self, StepOutcome::Completed)
    }
}

/// A best-effort step that was skipped, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedStep {
    pub step: &'static str,
    pub reason: String,
}

/// How a fulfillment job concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobDisposition {
    /// Payment approved and the order durably marked `PROCESSED`.
    Processed,
    /// Payment declined; the order was marked `PAYMENT_FAILED` and
    /// steps 2-5 never ran.
    PaymentFailed,
}

/// Summary of one completed job run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FulfillmentReport {
    pub order_id: OrderId,
    pub disposition: JobDisposition,
    /// Best-effort steps that were skipped during this run.
    pub skipped: Vec<SkippedStep>,
}

impl FulfillmentReport {
    /// Returns true if the given step was skipped in this run.
    pub fn step_skipped(&self, step: &str) -> bool {
        self.skipped.iter().any(|s| s.step == step)
    }
}

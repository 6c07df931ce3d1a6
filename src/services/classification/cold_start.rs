// Cold-Start/Retry Manager
// Classifies classifier failures into transient vs terminal and reports a
// scan-level outcome. Single attempt with a classified outcome: the manager
// never re-issues the original request; resubmission stays with the caller.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::models::ScanStatus;

use super::client::ClassifierError;

/// Markers whose presence in a rendered error means the remote model is
/// likely waking up rather than broken.
const TRANSIENT_MARKERS: [&str; 3] = ["503", "timeout", "Gateway Timeout"];

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorClass {
    Transient,
    Terminal,
}

/// Typed classification of a failed call, independent of the state machine.
pub fn classify_error(err: &ClassifierError) -> ErrorClass {
    let rendered = err.to_string();
    if TRANSIENT_MARKERS.iter().any(|m| rendered.contains(m)) {
        ErrorClass::Transient
    } else {
        ErrorClass::Terminal
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ColdStartState {
    Idle,
    InFlight,
    ColdStartWait,
    Failed,
    Succeeded,
}

pub struct ColdStartManager {
    state: ColdStartState,
    wait: Duration,
}

impl ColdStartManager {
    pub fn new(wait: Duration) -> Self {
        Self {
            state: ColdStartState::Idle,
            wait,
        }
    }

    pub fn state(&self) -> ColdStartState {
        self.state
    }

    /// Mark the classification round as issued.
    pub fn begin(&mut self) {
        self.state = ColdStartState::InFlight;
    }

    /// A normal classification result arrived.
    pub fn succeed(&mut self) {
        self.state = ColdStartState::Succeeded;
    }

    /// Settle a failed call into a reportable outcome.
    ///
    /// Transient failures hold for the configured delay before reporting
    /// `coldStart`, giving the remote model time to warm before the caller
    /// resubmits. Anything else reports `maxAttempts` immediately.
    pub async fn fail(&mut self, err: &ClassifierError) -> ScanStatus {
        match classify_error(err) {
            ErrorClass::Transient => {
                self.state = ColdStartState::ColdStartWait;
                info!(
                    wait_secs = self.wait.as_secs(),
                    "transient classifier failure, holding for cold start: {}", err
                );
                sleep(self.wait).await;
                ScanStatus::ColdStart
            }
            ErrorClass::Terminal => {
                self.state = ColdStartState::Failed;
                warn!("terminal classifier failure: {}", err);
                ScanStatus::MaxAttempts
            }
        }
    }
}

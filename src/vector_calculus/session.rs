//! Holds the report on display. A synchronous submission replaces it only on success;
//! a background submission hands out a [`Ticket`], and issuing a newer ticket (or a
//! synchronous submission) makes every older ticket stale, so a late result never
//! overwrites a newer one.
use crate::vector_calculus::errors::CalcError;
use crate::vector_calculus::request::{CalculationReport, CalculationRequest};
use log::{debug, info};
use std::thread::{self, JoinHandle};

pub struct Ticket {
    generation: u64,
    handle: JoinHandle<Result<CalculationReport, CalcError>>,
}

impl Ticket {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

#[derive(Debug, Default)]
pub struct CalculationSession {
    issued: u64,
    report: Option<CalculationReport>,
}

impl CalculationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// most recently completed report, if any
    pub fn current(&self) -> Option<&CalculationReport> {
        self.report.as_ref()
    }

    /// Runs `request` on the calling thread. On error the stored report is untouched.
    pub fn submit(&mut self, request: &CalculationRequest) -> Result<&CalculationReport, CalcError> {
        self.issued += 1;
        let report = request.run()?;
        Ok(self.report.insert(report))
    }

    /// Runs `request` on a worker thread.
    pub fn submit_background(&mut self, request: CalculationRequest) -> Ticket {
        self.issued += 1;
        info!("{} request {} started in background", request.kind(), self.issued);
        let handle = thread::spawn(move || request.run());
        Ticket {
            generation: self.issued,
            handle,
        }
    }

    /// Waits for the worker behind `ticket`. Returns `Ok(None)` when a newer request was
    /// issued in the meantime; the stale outcome, success or error, is dropped.
    pub fn complete(&mut self, ticket: Ticket) -> Result<Option<&CalculationReport>, CalcError> {
        let outcome = ticket
            .handle
            .join()
            .map_err(|_| CalcError::Worker("calculation thread panicked".to_string()))?;
        if ticket.generation != self.issued {
            debug!(
                "request {} finished after request {} was issued, dropped",
                ticket.generation, self.issued
            );
            return Ok(None);
        }
        let report = outcome?;
        Ok(Some(self.report.insert(report)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_calculus::request::RegionInput;

    fn divergence(field: &[&str], region: &str) -> CalculationRequest {
        CalculationRequest::Divergence {
            field: field.iter().map(|c| c.to_string()).collect(),
            region: RegionInput::new(region, "rectangular"),
        }
    }

    #[test]
    fn test_error_keeps_previous_report() {
        let mut session = CalculationSession::new();
        assert!(session.current().is_none());
        let first = session.submit(&divergence(&["x", "y", "z"], "cube")).unwrap().clone();
        assert_eq!(first.result.to_string(), "24");

        let err = session.submit(&divergence(&["x", "y", "z"], "torus"));
        assert!(matches!(err, Err(CalcError::UnsupportedRegion { .. })));
        assert_eq!(session.current(), Some(&first));
    }

    #[test]
    fn test_stale_ticket_is_dropped() {
        let mut session = CalculationSession::new();
        let old = session.submit_background(divergence(&["x", "0", "0"], "cube"));
        let new = session.submit_background(divergence(&["x", "y", "z"], "cube"));

        assert_eq!(session.complete(old).unwrap(), None);
        assert!(session.current().is_none());
        let report = session.complete(new).unwrap().unwrap();
        assert_eq!(report.result.to_string(), "24");
    }

    #[test]
    fn test_synchronous_submit_invalidates_pending_ticket() {
        let mut session = CalculationSession::new();
        let pending = session.submit_background(divergence(&["x", "0", "0"], "cube"));
        session.submit(&divergence(&["x", "y", "z"], "cube")).unwrap();
        assert_eq!(session.complete(pending).unwrap(), None);
        assert_eq!(session.current().unwrap().result.to_string(), "24");
    }

    #[test]
    fn test_background_error_is_returned() {
        let mut session = CalculationSession::new();
        let ticket = session.submit_background(divergence(&["x", "y"], "cube"));
        assert!(matches!(session.complete(ticket), Err(CalcError::InvalidInput(_))));
        assert!(session.current().is_none());
    }
}

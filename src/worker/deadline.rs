use std::time::{Duration, Instant};

use crate::utils::error::WorkerError;

/// Tracks one job's `full_process_start_time` against its `ack_wait` budget
/// (spec §5, §4.7 step 5). The dispatcher calls [`Deadline::check`] between
/// every extracted item and every chunk; once remaining budget drops below
/// `threshold_ratio * ack_wait`, processing is cut short with
/// [`WorkerError::DeadlineExceeded`] rather than risking redelivery racing
/// an in-flight write.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    ack_wait: Duration,
    threshold: Duration,
}

impl Deadline {
    pub fn new(ack_wait: Duration, threshold_ratio: f64) -> Self {
        let threshold = ack_wait.mul_f64(threshold_ratio.clamp(0.0, 1.0));
        Self {
            start: Instant::now(),
            ack_wait,
            threshold,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn remaining(&self) -> Duration {
        self.ack_wait.saturating_sub(self.elapsed())
    }

    pub fn check(&self) -> Result<(), WorkerError> {
        if self.remaining() <= self.threshold {
            return Err(WorkerError::DeadlineExceeded(self.elapsed()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_deadline_has_full_budget_remaining() {
        let deadline = Deadline::new(Duration::from_secs(3600), 0.05);
        assert!(deadline.check().is_ok());
        assert!(deadline.remaining() > Duration::from_secs(3000));
    }

    #[test]
    fn zero_ack_wait_is_immediately_exceeded() {
        let deadline = Deadline::new(Duration::from_secs(0), 0.05);
        assert!(deadline.check().is_err());
    }
}

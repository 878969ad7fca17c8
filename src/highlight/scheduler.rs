use std::time::{Duration, Instant};

/// Single-shot frame deadline that coalesces bursts of recompute requests.
///
/// The first request arms a deadline one interval later; requests made while armed
/// fold into it.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    interval: Duration,
    deadline: Option<Instant>,
}

impl FrameScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Request a frame. Returns `true` when this request armed a new deadline.
    pub fn request(&mut self, now: Instant) -> bool {
        if self.deadline.is_some() {
            return false;
        }
        self.deadline = Some(now + self.interval);
        true
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Disarm and report the frame if its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_within_a_frame_coalesce() {
        let mut frames = FrameScheduler::new(Duration::from_millis(16));
        let start = Instant::now();
        assert!(frames.request(start));
        assert!(!frames.request(start + Duration::from_millis(5)));
        assert!(!frames.request(start + Duration::from_millis(10)));
        assert_eq!(frames.deadline(), Some(start + Duration::from_millis(16)));

        assert!(!frames.take_due(start + Duration::from_millis(15)));
        assert!(frames.take_due(start + Duration::from_millis(16)));
        assert!(!frames.is_pending());
        assert!(!frames.take_due(start + Duration::from_millis(40)));
    }

    #[test]
    fn cancel_drops_the_pending_frame() {
        let mut frames = FrameScheduler::new(Duration::from_millis(16));
        let start = Instant::now();
        frames.request(start);
        frames.cancel();
        assert!(!frames.take_due(start + Duration::from_secs(1)));
        assert!(frames.request(start + Duration::from_secs(1)));
    }
}

/// Pause a configured number of seconds before the true end
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EarlyStopPolicy {
    end_offset: f64,
}

impl EarlyStopPolicy {
    pub fn new(end_offset: f64) -> Self {
        Self { end_offset }
    }

    pub fn end_offset(&self) -> f64 {
        self.end_offset
    }

    /// Playback position at which the stop happens
    pub fn stop_time(&self, duration: f64) -> f64 {
        duration - self.end_offset
    }

    /// Whether playback has reached the stop point. Always false until the
    /// duration is known.
    pub fn should_stop(&self, duration: Option<f64>, current_time: f64) -> bool {
        match duration {
            Some(duration) => current_time >= self.stop_time(duration),
            None => false,
        }
    }
}

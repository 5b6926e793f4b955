use std::time::Duration;

use rand::Rng;

use crate::config::DelayMode;

/// Pause to take before starting the job at `position` in a run with
/// `workers` slots. Only the first wave (`position < workers`) is delayed.
pub fn pre_start_delay(mode: DelayMode, position: usize, workers: usize) -> Option<Duration> {
    if position >= workers {
        return None;
    }
    match mode {
        DelayMode::None => None,
        DelayMode::Random => {
            let mut rng = rand::thread_rng();
            Some(Duration::from_secs(rng.gen_range(0..workers as u64)))
        }
        DelayMode::Indexed => Some(Duration::from_secs(position as u64)),
        DelayMode::Fixed(secs) => Some(Duration::from_secs_f64(position as f64 * secs)),
    }
}

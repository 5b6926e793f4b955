use crate::scheduler::RunSnapshot;

/// Bar geometry for one redraw, derived entirely from a counters snapshot
/// and the bar width.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// `(slot, columns)` for every slot that has completed a job
    pub slot_bars: Vec<(usize, usize)>,
    /// Green segment of the summary bar
    pub succeeded_cols: usize,
    /// Yellow segment of the summary bar
    pub in_flight_cols: usize,
    /// Red segment filling the rest of the summary bar
    pub remainder_cols: usize,
    /// Completed share of the run, in percent
    pub percent: f64,
}

impl Frame {
    pub fn compute(snapshot: &RunSnapshot, bar_width: usize) -> Self {
        let total = snapshot.total;
        let fraction = |n: usize| {
            if total == 0 {
                0.0
            } else {
                n as f64 / total as f64
            }
        };
        let cols = |f: f64| (f * bar_width as f64).floor().clamp(0.0, bar_width as f64) as usize;

        let progress = fraction(snapshot.completed());
        let most = snapshot.per_slot.values().copied().max().unwrap_or(0);
        let slot_bars = snapshot
            .per_slot
            .iter()
            .map(|(&slot, &count)| {
                let share = if most == 0 {
                    0.0
                } else {
                    count as f64 / most as f64
                };
                (slot, cols(progress * share))
            })
            .collect();

        let succeeded_cols = cols(fraction(snapshot.succeeded));
        let in_flight_cols = cols(fraction(snapshot.in_flight)).min(bar_width - succeeded_cols);
        let remainder_cols = bar_width - succeeded_cols - in_flight_cols;

        Self {
            slot_bars,
            succeeded_cols,
            in_flight_cols,
            remainder_cols,
            percent: progress * 100.0,
        }
    }
}

//! # Step Window
//!
//! [`StepWindow`] is the lock-free primitive behind every windowed metric. For
//! each poller cadence it keeps two slots: the *write* slot receiving values for
//! the step in progress, and the *drain* slot holding the step that just ended.
//!
//! ## Slot Selection
//!
//! Which physical slot is the write slot is a pure function of time:
//!
//! ```text
//! step  = now / interval
//! write = 2 * poller + step % 2
//! drain = 2 * poller + (step + 1) % 2
//! ```
//!
//! There is no "current" pointer to swap. The only coordination is a
//! compare-and-set on the last initialized step index per cadence: the single
//! thread that wins it for a new step clears whatever the reused slot still held
//! from two steps ago.
//!
//! ## Polling
//!
//! A poll swaps the drain slot back to the baseline and records the poll time.
//! Comparing with the previous poll time classifies the poll:
//!
//! - **Repolled**: the previous poll was in the same step. The drain slot was
//!   already extracted, so the result is normally the baseline.
//! - **Missed**: one or more whole steps passed without a poll. The drain slot
//!   may hold data from an older step, so [`Datapoint::UNKNOWN`] is returned.
//! - **Polled**: on cadence (or the very first poll).
//!
//! Each outcome increments the matching counter in
//! [`crate::context::PollDiagnostics`].

use crate::context::MetricContext;
use crate::datapoint::Datapoint;
use crossbeam::utils::CachePadded;
use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use tracing::debug;

/// Two-slot, per-cadence accumulator driven by the clock
pub struct StepWindow {
    baseline: i64,
    context: MetricContext,
    slots: Box<[CachePadded<AtomicI64>]>,
    last_poll_time: Box<[AtomicU64]>,
    last_init_step: Box<[AtomicU64]>,
}

impl StepWindow {
    /// Create a window whose slots start at, and reset to, `baseline`
    pub fn new(baseline: i64, context: MetricContext) -> Self {
        let num_pollers = context.pollers().len();
        Self {
            baseline,
            slots: (0..2 * num_pollers)
                .map(|_| CachePadded::new(AtomicI64::new(baseline)))
                .collect(),
            last_poll_time: (0..num_pollers).map(|_| AtomicU64::new(0)).collect(),
            last_init_step: (0..num_pollers).map(|_| AtomicU64::new(0)).collect(),
            context,
        }
    }

    pub fn baseline(&self) -> i64 {
        self.baseline
    }

    pub fn context(&self) -> &MetricContext {
        &self.context
    }

    /// Number of cadences this window tracks
    pub fn poller_count(&self) -> usize {
        self.last_poll_time.len()
    }

    /// Add `amount` to the write slot of every cadence
    pub fn accumulate(&self, amount: i64) {
        for poller_index in 0..self.poller_count() {
            let pos = self.resolve_slot(poller_index);
            self.slots[pos].fetch_add(amount, Ordering::AcqRel);
        }
    }

    /// The live write slot for a cadence, for callers doing their own atomic
    /// updates such as `fetch_min`/`fetch_max`
    pub fn current_slot(&self, poller_index: usize) -> &AtomicI64 {
        &self.slots[self.resolve_slot(poller_index)]
    }

    fn resolve_slot(&self, poller_index: usize) -> usize {
        let now = self.context.now_ms();
        let step = self.context.pollers().interval(poller_index);
        let step_index = now / step;
        let pos = 2 * poller_index + (step_index % 2) as usize;

        let observed = self.slots[pos].load(Ordering::Acquire);
        let last_init = &self.last_init_step[poller_index];
        let last = last_init.load(Ordering::Acquire);
        if last != step_index
            && last_init
                .compare_exchange(last, step_index, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        {
            // Only clear what was observed; a racing writer that already added
            // to the new step keeps its contribution.
            let _ = self.slots[pos].compare_exchange(
                observed,
                self.baseline,
                Ordering::AcqRel,
                Ordering::Relaxed,
            );
        }
        pos
    }

    /// Extract the value of the step that just completed for a cadence and
    /// reset its slot to the baseline
    ///
    /// A second poll inside the same step returns whatever the first poll left
    /// behind, which is normally the baseline.
    pub fn poll(&self, poller_index: usize) -> Datapoint {
        let now = self.context.now_ms();
        let step = self.context.pollers().interval(poller_index);
        let step_index = now / step;
        let drain = 2 * poller_index + ((step_index + 1) % 2) as usize;
        let value = self.slots[drain].swap(self.baseline, Ordering::AcqRel);

        let last = self.last_poll_time[poller_index].swap(now, Ordering::AcqRel);
        // A clock that went backwards counts as no missed steps.
        let missed = (now.saturating_sub(last) / step).saturating_sub(1);
        let diagnostics = self.context.diagnostics();

        if last / step == step_index {
            diagnostics.record_repolled();
            debug!(poller_index, step_index, "Repolled within the same step");
            Datapoint::new(step_index * step, value)
        } else if last > 0 && missed > 0 {
            diagnostics.record_missed(i64::try_from(missed).unwrap_or(i64::MAX));
            debug!(poller_index, missed, "Missed polling intervals");
            Datapoint::UNKNOWN
        } else {
            diagnostics.record_polled();
            Datapoint::new(step_index * step, value)
        }
    }

    /// Current contents of every slot, without resetting anything
    pub fn slot_values(&self) -> impl Iterator<Item = i64> + '_ {
        self.slots.iter().map(|slot| slot.load(Ordering::Acquire))
    }
}

impl PartialEq for StepWindow {
    fn eq(&self, other: &Self) -> bool {
        self.baseline == other.baseline && self.slot_values().eq(other.slot_values())
    }
}

impl Eq for StepWindow {}

impl std::hash::Hash for StepWindow {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.baseline.hash(state);
        for value in self.slot_values() {
            value.hash(state);
        }
    }
}

impl fmt::Debug for StepWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let load_all = |values: &[AtomicU64]| -> Vec<u64> {
            values.iter().map(|v| v.load(Ordering::Relaxed)).collect()
        };
        f.debug_struct("StepWindow")
            .field("baseline", &self.baseline)
            .field("data", &self.slot_values().collect::<Vec<_>>())
            .field("last_poll_time", &load_all(&self.last_poll_time[..]))
            .field("last_init_step", &load_all(&self.last_init_step[..]))
            .finish()
    }
}

/// Session counters, only ever incremented by committed dismissals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    snooze_count: u32,
    wake_up_success: u32,
}

impl Statistics {
    #[must_use]
    pub const fn snooze_count(&self) -> u32 {
        self.snooze_count
    }

    #[must_use]
    pub const fn wake_up_success(&self) -> u32 {
        self.wake_up_success
    }

    pub(crate) fn record_snooze(&mut self) {
        self.snooze_count = self.snooze_count.saturating_add(1);
    }

    pub(crate) fn record_wake_up(&mut self) {
        self.wake_up_success = self.wake_up_success.saturating_add(1);
    }
}

/// Time primitives
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Default)]
pub struct Time(pub f64); // seconds

impl Time {
    pub fn from_millis(ms: u64) -> Self {
        Self(ms as f64 / 1000.0)
    }

    /// Returns the instant `ms` milliseconds after `self`.
    pub fn after_millis(self, ms: u64) -> Self {
        Self(self.0 + ms as f64 / 1000.0)
    }
}

/// Delay code of a service that will not run.
pub const CANCELLED: &str = "cancel";

/// One scheduled service as shown on the button, normalized by the feed parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    train: String,
    destination: String,
    scheduled_time: String,
    actual_time: String,
    platform: String,
    delay: String,
    is_delayed: bool,
}

impl Departure {
    pub fn new(train: String, destination: String, scheduled_time: String, actual_time: String, platform: String, delay: String, is_delayed: bool) -> Self {
        Self { train, destination, scheduled_time, actual_time, platform, delay, is_delayed }
    }

    pub fn train(&self) -> &str {
        &self.train
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn scheduled_time(&self) -> &str {
        &self.scheduled_time
    }

    pub fn actual_time(&self) -> &str {
        &self.actual_time
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    pub fn delay(&self) -> &str {
        &self.delay
    }

    pub fn is_delayed(&self) -> bool {
        self.is_delayed
    }

    pub fn is_cancelled(&self) -> bool {
        self.delay == CANCELLED
    }
}

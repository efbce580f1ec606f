//! Scene time and time intervals.
//!
//! The core never interprets wall-clock time; [`SceneTime`] is an opaque
//! second count on the simulation clock. [`SceneTime::MINIMUM`] is the
//! reference instant used when sampling constant properties during static
//! option evaluation.

/// An instant on the simulation clock, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct SceneTime {
    seconds: f64,
}

impl SceneTime {
    /// The earliest representable instant. Constant properties are sampled
    /// here when building static geometry options.
    pub const MINIMUM: Self = Self {
        seconds: f64::NEG_INFINITY,
    };

    #[must_use]
    pub const fn from_seconds(seconds: f64) -> Self {
        Self { seconds }
    }

    #[must_use]
    pub const fn seconds(self) -> f64 {
        self.seconds
    }
}

/// A closed interval `[start, stop]` of scene time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeInterval {
    pub start: SceneTime,
    pub stop: SceneTime,
}

impl TimeInterval {
    #[must_use]
    pub const fn new(start: SceneTime, stop: SceneTime) -> Self {
        Self { start, stop }
    }

    #[must_use]
    pub fn contains(&self, time: SceneTime) -> bool {
        self.start <= time && time <= self.stop
    }
}

/// An ordered set of non-overlapping time intervals.
///
/// Used for entity availability: an entity with no collection is available
/// at all times.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeIntervalCollection {
    intervals: Vec<TimeInterval>,
}

impl TimeIntervalCollection {
    #[must_use]
    pub fn new(intervals: Vec<TimeInterval>) -> Self {
        Self { intervals }
    }

    #[must_use]
    pub fn contains(&self, time: SceneTime) -> bool {
        self.intervals.iter().any(|i| i.contains(time))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_contains_endpoints() {
        let i = TimeInterval::new(SceneTime::from_seconds(0.0), SceneTime::from_seconds(10.0));
        assert!(i.contains(SceneTime::from_seconds(0.0)));
        assert!(i.contains(SceneTime::from_seconds(10.0)));
        assert!(!i.contains(SceneTime::from_seconds(10.5)));
    }

    #[test]
    fn minimum_precedes_everything() {
        assert!(SceneTime::MINIMUM < SceneTime::from_seconds(f64::MIN));
    }

    #[test]
    fn collection_checks_all_intervals() {
        let c = TimeIntervalCollection::new(vec![
            TimeInterval::new(SceneTime::from_seconds(0.0), SceneTime::from_seconds(1.0)),
            TimeInterval::new(SceneTime::from_seconds(5.0), SceneTime::from_seconds(6.0)),
        ]);
        assert!(c.contains(SceneTime::from_seconds(5.5)));
        assert!(!c.contains(SceneTime::from_seconds(3.0)));
    }
}

use std::time::{Duration, Instant};

/// Distance from the bottom, in pixels, within which the view sticks to
/// new content.
pub const BOTTOM_THRESHOLD: i32 = 50;
/// How long a scroll issued by the view is told apart from user scrolls.
pub const PROGRAMMATIC_LATCH: Duration = Duration::from_millis(100);

/// Decides whether the transcript view follows new content.
///
/// Following starts out enabled. Scrolling up by hand turns it off and
/// scrolling back near the bottom turns it on again. Scrolls the view
/// issues itself, reported back by the toolkit shortly after, are ignored.
/// Every method takes the current time so tests can drive the clock.
#[derive(Clone, Debug)]
pub struct ScrollTracker {
    auto_scroll: bool,
    last_value: i32,
    programmatic_until: Option<Instant>,
}

impl Default for ScrollTracker {
    fn default() -> Self {
        Self {
            auto_scroll: true,
            last_value: 0,
            programmatic_until: None,
        }
    }
}

impl ScrollTracker {
    /// Creates a tracker that follows new content.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the view currently follows new content.
    #[inline]
    pub fn is_auto_scroll(&self) -> bool {
        self.auto_scroll
    }

    /// Called when content was appended. Returns whether the renderer
    /// should scroll to the bottom, and latches the scroll it will cause.
    pub fn request_scroll(&mut self, now: Instant) -> bool {
        if !self.auto_scroll {
            return false;
        }
        self.programmatic_until = Some(now + PROGRAMMATIC_LATCH);
        true
    }

    /// Reports a scroll position change of the transcript view.
    pub fn on_scroll(&mut self, value: i32, maximum: i32, now: Instant) {
        let latched = self.programmatic_until.is_some_and(|until| now < until);
        if !latched {
            self.programmatic_until = None;
            if maximum - value <= BOTTOM_THRESHOLD {
                self.auto_scroll = true;
            } else if value < self.last_value {
                self.auto_scroll = false;
            }
        }
        self.last_value = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_scroll_toggles_following() {
        let start = Instant::now();
        let mut tracker = ScrollTracker::new();
        tracker.on_scroll(900, 1000, start);
        assert!(tracker.is_auto_scroll());

        tracker.on_scroll(600, 1000, start);
        assert!(!tracker.is_auto_scroll());
        assert!(!tracker.request_scroll(start));

        // Moving down but still far from the bottom changes nothing.
        tracker.on_scroll(800, 1000, start);
        assert!(!tracker.is_auto_scroll());

        tracker.on_scroll(960, 1000, start);
        assert!(tracker.is_auto_scroll());
    }

    #[test]
    fn test_programmatic_latch() {
        let start = Instant::now();
        let mut tracker = ScrollTracker::new();
        tracker.on_scroll(1000, 1000, start);

        assert!(tracker.request_scroll(start));
        // Content grew and the toolkit reports an intermediate position.
        tracker.on_scroll(400, 2000, start + Duration::from_millis(10));
        assert!(tracker.is_auto_scroll());

        tracker.on_scroll(300, 2000, start + PROGRAMMATIC_LATCH);
        assert!(!tracker.is_auto_scroll());
    }
}

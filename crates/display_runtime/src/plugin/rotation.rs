//! Sub-item rotation for composite plugins
//!
//! Some plugins show several items (time, then date; temperature, then
//! humidity) inside one slot. The slot's view duration is split evenly across
//! the enabled items, never below a per-item floor. The scheduler never sees
//! this inner cursor.

use std::time::Duration;

use crate::timer::Timer;

/// Inner cursor plus per-item duration for a composite plugin
#[derive(Debug, Clone)]
pub struct SubItemRotation {
    enabled: Vec<bool>,
    current: Option<usize>,
    view_duration: Option<Duration>,
    min_item_duration: Duration,
    item_duration: Duration,
    timer: Timer,
}

impl SubItemRotation {
    /// Create a rotation over `count` items, all enabled
    pub fn new(count: usize, min_item_duration: Duration) -> Self {
        let mut rotation = Self {
            enabled: vec![true; count],
            current: None,
            view_duration: None,
            min_item_duration,
            item_duration: min_item_duration,
            timer: Timer::new(),
        };
        rotation.recalculate();
        rotation
    }

    /// Number of items, enabled or not
    pub fn len(&self) -> usize {
        self.enabled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty()
    }

    /// Number of enabled items
    pub fn enabled_count(&self) -> usize {
        self.enabled.iter().filter(|e| **e).count()
    }

    pub fn is_item_enabled(&self, item: usize) -> bool {
        self.enabled.get(item).copied().unwrap_or(false)
    }

    /// Enable or disable one item; unknown items are ignored
    pub fn set_item_enabled(&mut self, item: usize, enabled: bool) {
        if let Some(slot) = self.enabled.get_mut(item) {
            if *slot != enabled {
                *slot = enabled;
                self.recalculate();
            }
        }
    }

    /// Set the total duration available to all items (`None` = infinite)
    pub fn set_view_duration(&mut self, duration: Option<Duration>) {
        if self.view_duration != duration {
            self.view_duration = duration;
            self.recalculate();
        }
    }

    /// Duration each enabled item is shown
    pub fn item_duration(&self) -> Duration {
        self.item_duration
    }

    /// Currently shown item
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Start again from the first enabled item on the next `tick`
    pub fn reset(&mut self) {
        self.current = None;
        self.timer.stop();
    }

    /// Advance if the current item's time is up and return the item to show
    pub fn tick(&mut self) -> Option<usize> {
        let current_valid = self.current.is_some_and(|item| self.is_item_enabled(item));

        if !current_valid {
            let from = self.current.map(|c| c + 1).unwrap_or(0);
            self.current = self.next_enabled(from);
            if self.current.is_some() {
                self.timer.start(self.item_duration);
            }
        } else if !self.timer.is_running() {
            self.timer.start(self.item_duration);
        } else if self.timer.is_timeout() {
            let from = self.current.map(|c| c + 1).unwrap_or(0);
            self.current = self.next_enabled(from);
            self.timer.start(self.item_duration);
        }

        self.current
    }

    fn next_enabled(&self, from: usize) -> Option<usize> {
        let count = self.enabled.len();
        (0..count)
            .map(|step| (from + step) % count)
            .find(|&item| self.enabled[item])
    }

    fn recalculate(&mut self) {
        let enabled = self.enabled_count() as u32;
        self.item_duration = match self.view_duration {
            Some(total) if enabled > 0 => (total / enabled).max(self.min_item_duration),
            _ => self.min_item_duration,
        };
        // The shown item stays and gets the new per-item duration
        if self.timer.is_running() {
            self.timer.start(self.item_duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_split_evenly() {
        let mut rotation = SubItemRotation::new(3, Duration::from_secs(2));
        rotation.set_view_duration(Some(Duration::from_secs(30)));
        assert_eq!(rotation.item_duration(), Duration::from_secs(10));

        rotation.set_item_enabled(1, false);
        assert_eq!(rotation.item_duration(), Duration::from_secs(15));
    }

    #[test]
    fn test_duration_floor() {
        let mut rotation = SubItemRotation::new(4, Duration::from_secs(5));
        rotation.set_view_duration(Some(Duration::from_secs(8)));
        assert_eq!(rotation.item_duration(), Duration::from_secs(5));

        rotation.set_view_duration(None);
        assert_eq!(rotation.item_duration(), Duration::from_secs(5));
    }

    #[test]
    fn test_no_enabled_items() {
        let mut rotation = SubItemRotation::new(2, Duration::from_secs(1));
        rotation.set_item_enabled(0, false);
        rotation.set_item_enabled(1, false);
        assert_eq!(rotation.tick(), None);
        assert_eq!(rotation.enabled_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rotates_over_enabled_items() {
        let mut rotation = SubItemRotation::new(3, Duration::from_millis(100));
        rotation.set_view_duration(Some(Duration::from_millis(600)));
        rotation.set_item_enabled(1, false);

        assert_eq!(rotation.tick(), Some(0));

        tokio::time::advance(Duration::from_millis(299)).await;
        assert_eq!(rotation.tick(), Some(0));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(rotation.tick(), Some(2));

        tokio::time::advance(Duration::from_millis(300)).await;
        assert_eq!(rotation.tick(), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabling_current_item_moves_on() {
        let mut rotation = SubItemRotation::new(3, Duration::from_millis(100));
        assert_eq!(rotation.tick(), Some(0));

        rotation.set_item_enabled(0, false);
        assert_eq!(rotation.tick(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_changes_rearm_current_item() {
        let mut rotation = SubItemRotation::new(3, Duration::from_millis(100));
        rotation.set_view_duration(Some(Duration::from_millis(300)));
        assert_eq!(rotation.tick(), Some(0));

        tokio::time::advance(Duration::from_millis(50)).await;
        rotation.set_view_duration(Some(Duration::from_millis(600)));
        assert_eq!(rotation.tick(), Some(0));

        rotation.set_item_enabled(2, false);
        assert_eq!(rotation.item_duration(), Duration::from_millis(300));
        assert_eq!(rotation.tick(), Some(0));

        tokio::time::advance(Duration::from_millis(299)).await;
        assert_eq!(rotation.tick(), Some(0));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(rotation.tick(), Some(1));
    }

    #[test]
    fn test_reset_starts_from_first_item() {
        let mut rotation = SubItemRotation::new(2, Duration::from_millis(100));
        rotation.set_item_enabled(0, false);
        assert_eq!(rotation.tick(), Some(1));

        rotation.set_item_enabled(0, true);
        rotation.reset();
        assert_eq!(rotation.tick(), Some(0));
    }
}

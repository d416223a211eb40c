//! Label stabilization
//!
//! The classifier emits one label per frame with a detected hand, and single
//! frames are frequently wrong. The debouncer keeps a sliding window of recent
//! labels and commits a label only when it dominates the window and the
//! cooldown since the previous commit has elapsed.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::types::{Commit, Label};

/// Default number of recent labels considered
pub const DEFAULT_WINDOW_CAPACITY: usize = 30;

/// Default occurrence count a label must exceed to commit
pub const DEFAULT_COMMIT_THRESHOLD: usize = 25;

/// Default minimum time between commits
pub const DEFAULT_COOLDOWN_MS: u64 = 2500;

/// Largest window a configuration may ask for
pub const MAX_WINDOW_CAPACITY: usize = 1024;

/// Sliding-window majority-vote debouncer with a commit cooldown
#[derive(Debug, Clone)]
pub struct StabilizationDebouncer {
    /// Most recent labels, oldest first
    window: VecDeque<Label>,
    /// Maximum window size
    capacity: usize,
    /// Occurrences a label must exceed to commit
    threshold: usize,
    /// Minimum time between commits
    cooldown: Duration,
    /// Last committed label
    last_label: Option<Label>,
    /// When the last commit happened (or when the cooldown was last restarted)
    last_commit_at: DateTime<Utc>,
}

impl StabilizationDebouncer {
    /// Create a debouncer whose first cooldown starts at `started_at`
    pub fn new(
        capacity: usize,
        threshold: usize,
        cooldown: std::time::Duration,
        started_at: DateTime<Utc>,
    ) -> Self {
        let preallocated = capacity.min(MAX_WINDOW_CAPACITY) + 1;
        Self {
            window: VecDeque::with_capacity(preallocated),
            capacity,
            threshold,
            cooldown: Duration::from_std(cooldown).unwrap_or(Duration::MAX),
            last_label: None,
            last_commit_at: started_at,
        }
    }

    /// Debouncer with the default window, threshold and cooldown
    pub fn with_defaults(started_at: DateTime<Utc>) -> Self {
        Self::new(
            DEFAULT_WINDOW_CAPACITY,
            DEFAULT_COMMIT_THRESHOLD,
            std::time::Duration::from_millis(DEFAULT_COOLDOWN_MS),
            started_at,
        )
    }

    /// Record one frame's label and return a commit if it became stable.
    ///
    /// Only frames with a detected hand should be observed.
    pub fn observe(&mut self, label: &str, now: DateTime<Utc>) -> Option<Commit> {
        self.window.push_back(label.to_string());
        while self.window.len() > self.capacity {
            self.window.pop_front();
        }

        let count = self.count(label);
        if count <= self.threshold {
            return None;
        }

        if now - self.last_commit_at <= self.cooldown {
            debug!(label, count, "stable label held back by cooldown");
            return None;
        }

        self.last_label = Some(label.to_string());
        self.last_commit_at = now;

        Some(Commit {
            label: label.to_string(),
            committed_at: now,
        })
    }

    /// Occurrences of `label` in the current window
    pub fn count(&self, label: &str) -> usize {
        self.window.iter().filter(|l| l.as_str() == label).count()
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn last_committed(&self) -> Option<&str> {
        self.last_label.as_deref()
    }

    pub fn last_commit_at(&self) -> DateTime<Utc> {
        self.last_commit_at
    }

    /// Forget the last committed label, keeping the window and cooldown
    pub fn clear_label(&mut self) {
        self.last_label = None;
    }

    /// Empty the window, forget the last label and restart the cooldown
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.window.clear();
        self.last_label = None;
        self.last_commit_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const FRAME_MS: i64 = 33;

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    fn at_frame(start: DateTime<Utc>, frame: i64) -> DateTime<Utc> {
        start + Duration::milliseconds(frame * FRAME_MS)
    }

    /// Debouncer whose start-up cooldown has already elapsed at `epoch()`
    fn warmed_up() -> StabilizationDebouncer {
        StabilizationDebouncer::with_defaults(epoch() - Duration::seconds(10))
    }

    #[test]
    fn test_commits_when_count_first_exceeds_threshold() {
        let mut debouncer = warmed_up();
        let mut commits = Vec::new();

        for frame in 0..30 {
            if let Some(commit) = debouncer.observe("Apple", at_frame(epoch(), frame)) {
                commits.push((frame, commit));
            }
        }

        assert_eq!(commits.len(), 1);
        // 26th observation is frame index 25
        assert_eq!(commits[0].0, 25);
        assert_eq!(commits[0].1.label, "Apple");
        assert_eq!(debouncer.last_committed(), Some("Apple"));
    }

    #[test]
    fn test_sustained_label_gated_by_cooldown() {
        let mut debouncer = warmed_up();
        let mut commit_frames = Vec::new();

        // 200 frames at 33ms = 6.6s of the same gesture
        for frame in 0..200 {
            if debouncer
                .observe("Apple", at_frame(epoch(), frame))
                .is_some()
            {
                commit_frames.push(frame);
            }
        }

        assert_eq!(commit_frames[0], 25);
        for pair in commit_frames.windows(2) {
            let elapsed = Duration::milliseconds((pair[1] - pair[0]) * FRAME_MS);
            assert!(elapsed > Duration::milliseconds(2500));
        }
        // 25 + 76 frames (2508ms) + 76 frames
        assert_eq!(commit_frames, vec![25, 101, 177]);
    }

    #[test]
    fn test_window_never_exceeds_capacity() {
        let mut debouncer = warmed_up();
        for frame in 0..100 {
            let label = if frame % 3 == 0 { "Add" } else { "Milk" };
            debouncer.observe(label, at_frame(epoch(), frame));
            assert!(debouncer.window_len() <= 30);
        }
        assert_eq!(debouncer.window_len(), 30);
    }

    #[test]
    fn test_noisy_stream_does_not_commit() {
        let mut debouncer = warmed_up();
        for frame in 0..300 {
            // 1 in 5 frames misclassified keeps the majority at 24/30
            let label = if frame % 5 == 0 { "Bread" } else { "Milk" };
            assert!(debouncer.observe(label, at_frame(epoch(), frame)).is_none());
        }
    }

    #[test]
    fn test_startup_cooldown() {
        let mut debouncer = StabilizationDebouncer::with_defaults(epoch());
        let mut first = None;
        for frame in 0..200 {
            if debouncer.observe("Milk", at_frame(epoch(), frame)).is_some() {
                first = Some(frame);
                break;
            }
        }
        // Window saturates at frame 25 but nothing commits until 2.5s have passed
        assert_eq!(first, Some(76));
    }

    #[test]
    fn test_reset_clears_window_and_restarts_cooldown() {
        let mut debouncer = warmed_up();
        for frame in 0..26 {
            debouncer.observe("Apple", at_frame(epoch(), frame));
        }
        assert_eq!(debouncer.last_committed(), Some("Apple"));

        let reset_at = at_frame(epoch(), 200);
        debouncer.reset(reset_at);
        assert_eq!(debouncer.window_len(), 0);
        assert_eq!(debouncer.last_committed(), None);
        assert_eq!(debouncer.last_commit_at(), reset_at);
    }

    #[test]
    fn test_gesture_held_across_reset_waits_for_cooldown() {
        let mut debouncer = warmed_up();
        let mut commit_frames = Vec::new();

        for frame in 0..400 {
            if frame == 200 {
                debouncer.reset(at_frame(epoch(), frame));
            }
            if debouncer.observe("Apple", at_frame(epoch(), frame)).is_some() {
                commit_frames.push(frame);
            }
        }

        // Window refills by frame 225, but the cooldown restarted at frame 200
        let after_reset: Vec<i64> = commit_frames.iter().copied().filter(|&f| f >= 200).collect();
        assert_eq!(after_reset[0], 276);
        assert!(at_frame(epoch(), 276) - at_frame(epoch(), 200) > Duration::milliseconds(2500));
        assert_eq!(commit_frames, vec![25, 101, 177, 276, 352]);
    }

    #[test]
    fn test_oversized_capacity_does_not_preallocate() {
        let debouncer =
            StabilizationDebouncer::new(usize::MAX, 1, std::time::Duration::from_secs(1), epoch());
        assert_eq!(debouncer.capacity(), usize::MAX);
        assert_eq!(debouncer.window_len(), 0);
    }

    #[test]
    fn test_clear_label_keeps_window() {
        let mut debouncer = warmed_up();
        for frame in 0..26 {
            debouncer.observe("Apple", at_frame(epoch(), frame));
        }
        debouncer.clear_label();
        assert_eq!(debouncer.last_committed(), None);
        assert_eq!(debouncer.window_len(), 26);
    }

    #[test]
    fn test_label_switch_requires_resaturation() {
        let mut debouncer = warmed_up();
        for frame in 0..30 {
            debouncer.observe("Apple", at_frame(epoch(), frame));
        }

        let mut switch_commit = None;
        for frame in 30..200 {
            if let Some(commit) = debouncer.observe("Add", at_frame(epoch(), frame)) {
                switch_commit = Some((frame, commit.label));
                break;
            }
        }
        // "Add" saturates at frame 55, the Apple cooldown holds it until frame 101
        assert_eq!(switch_commit, Some((101, "Add".to_string())));
    }
}

use std::collections::VecDeque;

use crate::game::{Outcome, Side};
use crate::training::episode::EpisodeRecord;

/// Result of a single episode as kept by the rolling window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeResult {
    /// `None` when the episode was cut short by an illegal move.
    pub outcome: Option<Outcome>,
    pub game_length: usize,
}

impl From<&EpisodeRecord> for EpisodeResult {
    fn from(record: &EpisodeRecord) -> Self {
        EpisodeResult {
            outcome: record.outcome,
            game_length: record.total_moves(),
        }
    }
}

/// Training metrics tracker with rolling window computations.
pub struct TrainingMetrics {
    episode_results: VecDeque<EpisodeResult>,
    capacity: usize,
    total_episodes: usize, // lifetime count, never capped
    cheated_episodes: usize,
}

impl TrainingMetrics {
    pub fn with_capacity(capacity: usize) -> Self {
        TrainingMetrics {
            episode_results: VecDeque::with_capacity(capacity),
            capacity,
            total_episodes: 0,
            cheated_episodes: 0,
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn record_episode(&mut self, result: EpisodeResult) {
        self.total_episodes += 1;
        if result.outcome.is_none() {
            self.cheated_episodes += 1;
        }
        self.episode_results.push_back(result);
        if self.episode_results.len() > self.capacity {
            self.episode_results.pop_front();
        }
    }

    fn rate(&self, last_n: usize, pred: impl Fn(&EpisodeResult) -> bool) -> f32 {
        let n = self.episode_results.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let hits = self
            .episode_results
            .iter()
            .rev()
            .take(n)
            .filter(|r| pred(r))
            .count();
        hits as f32 / n as f32
    }

    /// Win rate for `side` in the last N episodes.
    pub fn win_rate(&self, side: Side, last_n: usize) -> f32 {
        self.rate(last_n, |r| r.outcome == Some(Outcome::Winner(side)))
    }

    /// Draw rate in the last N episodes.
    pub fn draw_rate(&self, last_n: usize) -> f32 {
        self.rate(last_n, |r| r.outcome == Some(Outcome::Draw))
    }

    /// Average game length over the last N episodes.
    pub fn average_game_length(&self, last_n: usize) -> f32 {
        let n = self.episode_results.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let total: usize = self
            .episode_results
            .iter()
            .rev()
            .take(n)
            .map(|r| r.game_length)
            .sum();
        total as f32 / n as f32
    }

    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }

    /// Lifetime count of episodes ended by an illegal move.
    pub fn cheated_episodes(&self) -> usize {
        self.cheated_episodes
    }
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(outcome: Option<Outcome>, game_length: usize) -> EpisodeResult {
        EpisodeResult {
            outcome,
            game_length,
        }
    }

    #[test]
    fn test_win_rate() {
        let mut m = TrainingMetrics::new();
        for _ in 0..7 {
            m.record_episode(result(Some(Outcome::Winner(Side::A)), 10));
        }
        for _ in 0..3 {
            m.record_episode(result(Some(Outcome::Winner(Side::B)), 10));
        }
        assert!((m.win_rate(Side::A, 10) - 0.7).abs() < 1e-6);
        assert!((m.win_rate(Side::B, 10) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_draw_rate() {
        let mut m = TrainingMetrics::new();
        m.record_episode(result(Some(Outcome::Draw), 9));
        m.record_episode(result(Some(Outcome::Winner(Side::A)), 5));
        assert!((m.draw_rate(10) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_average_game_length() {
        let mut m = TrainingMetrics::new();
        m.record_episode(result(None, 20));
        m.record_episode(result(None, 30));
        assert!((m.average_game_length(10) - 25.0).abs() < 1e-6);
        assert_eq!(m.cheated_episodes(), 2);
    }

    #[test]
    fn test_window_drops_old_results() {
        let mut m = TrainingMetrics::with_capacity(2);
        m.record_episode(result(Some(Outcome::Winner(Side::B)), 1));
        m.record_episode(result(Some(Outcome::Winner(Side::A)), 1));
        m.record_episode(result(Some(Outcome::Winner(Side::A)), 1));
        assert_eq!(m.win_rate(Side::B, 10), 0.0);
        assert_eq!(m.total_episodes(), 3);
    }

    #[test]
    fn test_empty_window() {
        let m = TrainingMetrics::new();
        assert_eq!(m.win_rate(Side::A, 10), 0.0);
        assert_eq!(m.average_game_length(10), 0.0);
    }
}

use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

use crate::ai::Transition;

/// Fixed-capacity ring buffer of transitions. Once full, each push evicts the
/// oldest transition.
pub struct ReplayBuffer {
    buffer: Vec<Transition>,
    capacity: usize,
    position: usize,
    rng: StdRng,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        Self::with_rng(capacity, StdRng::from_os_rng())
    }

    pub fn with_seed(capacity: usize, seed: u64) -> Self {
        Self::with_rng(capacity, StdRng::seed_from_u64(seed))
    }

    fn with_rng(capacity: usize, rng: StdRng) -> Self {
        assert!(capacity > 0, "replay capacity must be > 0");
        ReplayBuffer {
            buffer: Vec::with_capacity(capacity),
            capacity,
            position: 0,
            rng,
        }
    }

    /// Add a transition, overwriting the oldest when full.
    pub fn push(&mut self, transition: Transition) {
        if self.buffer.len() < self.capacity {
            self.buffer.push(transition);
        } else {
            self.buffer[self.position] = transition;
        }
        self.position = (self.position + 1) % self.capacity;
    }

    /// Sample `batch_size` distinct transitions uniformly, or `None` while the
    /// buffer holds fewer than that.
    pub fn sample(&mut self, batch_size: usize) -> Option<Vec<Transition>> {
        if batch_size > self.buffer.len() {
            return None;
        }
        let indices = index::sample(&mut self.rng, self.buffer.len(), batch_size);
        Some(indices.iter().map(|i| self.buffer[i].clone()).collect())
    }

    /// Stored transitions, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        let split = if self.buffer.len() < self.capacity {
            0
        } else {
            self.position
        };
        self.buffer[split..].iter().chain(self.buffer[..split].iter())
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Board, Opening, Position};

    /// Transition tagged by its reward so eviction order is visible.
    fn transition(tag: usize) -> Transition {
        let state = Board::new(3, Opening::Empty);
        Transition {
            state: state.clone(),
            action: Position::new(0, 0),
            reward: tag as f32,
            next_state: state,
            terminal: false,
        }
    }

    fn tags(buf: &ReplayBuffer) -> Vec<usize> {
        buf.iter().map(|t| t.reward as usize).collect()
    }

    #[test]
    fn test_push_and_len() {
        let mut buf = ReplayBuffer::new(10);
        assert!(buf.is_empty());

        buf.push(transition(0));
        assert_eq!(buf.len(), 1);

        for i in 1..10 {
            buf.push(transition(i));
        }
        assert_eq!(buf.len(), 10);
        assert_eq!(buf.capacity(), 10);
        assert_eq!(tags(&buf), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_overflow_keeps_most_recent() {
        let capacity = 5;
        let extra = 7;
        let mut buf = ReplayBuffer::with_seed(capacity, 1);
        for i in 0..capacity + extra {
            buf.push(transition(i));
        }
        assert_eq!(buf.len(), capacity);
        assert_eq!(tags(&buf), (extra..capacity + extra).collect::<Vec<_>>());
    }

    #[test]
    fn test_sample_is_without_replacement() {
        let mut buf = ReplayBuffer::with_seed(100, 3);
        for i in 0..50 {
            buf.push(transition(i));
        }
        let batch = buf.sample(10).unwrap();
        assert_eq!(batch.len(), 10);

        let mut seen: Vec<usize> = batch.iter().map(|t| t.reward as usize).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 10);
    }

    #[test]
    fn test_sample_before_batch_is_available() {
        let mut buf = ReplayBuffer::new(10);
        buf.push(transition(0));
        assert!(buf.sample(5).is_none());
        assert_eq!(buf.sample(1).unwrap().len(), 1);
    }
}

/// Linear schedule from `start` to `floor` across `episodes` episodes.
///
/// Episode 0 gets `start`, episode `episodes - 1` gets `floor`, and anything
/// later stays at `floor`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearDecay {
    pub start: f32,
    pub floor: f32,
    pub episodes: usize,
}

impl LinearDecay {
    pub fn new(start: f32, floor: f32, episodes: usize) -> Self {
        LinearDecay {
            start,
            floor,
            episodes,
        }
    }

    pub fn value(&self, episode: usize) -> f32 {
        if self.episodes <= 1 {
            return self.start;
        }
        let progress = (episode as f32 / (self.episodes - 1) as f32).min(1.0);
        self.start + (self.floor - self.start) * progress
    }
}

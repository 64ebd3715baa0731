//! Echo effect.
//!
//! Each channel has own feedback delay line, the repeats decay by `feedback` each time. Feedback
//! of 1.0 or higher is not clamped and makes the echo grow forever.

use crate::{dsp::DelayLine, effects::EffectRenderTrait};

/// See module docs.
#[derive(Debug, Clone, PartialEq)]
pub struct Echo {
    max_delay: f32,
    delay_time: f32,
    feedback: f32,
    delay_gain: f32,
    dry: f32,
    left: DelayLine,
    right: DelayLine,
}

impl Default for Echo {
    fn default() -> Self {
        Self::new(44100, Self::DEFAULT_MAX_DELAY)
    }
}

impl Echo {
    /// Default longest delay (in seconds) an echo can hold.
    pub const DEFAULT_MAX_DELAY: f32 = 2.0;

    /// Creates new echo which can delay up to `max_delay` seconds. Initial delay is 250 ms with
    /// half feedback and half gain of the repeats.
    pub fn new(sample_rate: u32, max_delay: f32) -> Self {
        let max_delay = max_delay.max(0.0);
        let capacity = Self::capacity_for(max_delay, sample_rate);
        Self {
            max_delay,
            delay_time: 0.25,
            feedback: 0.5,
            delay_gain: 0.5,
            dry: 1.0,
            left: DelayLine::new(capacity, sample_rate),
            right: DelayLine::new(capacity, sample_rate),
        }
    }

    fn capacity_for(max_delay: f32, sample_rate: u32) -> usize {
        (max_delay * sample_rate as f32).ceil() as usize + 1
    }

    /// Returns longest delay (in seconds) the echo can hold.
    pub fn max_delay(&self) -> f32 {
        self.max_delay
    }

    /// Returns sample rate the echo runs at.
    pub fn sample_rate(&self) -> u32 {
        self.left.sample_rate()
    }

    /// Sets time between repeats in seconds. Values longer than the line can hold are clamped
    /// while rendering.
    pub fn set_delay_time(&mut self, delay_time: f32) {
        self.delay_time = delay_time.max(0.0);
    }

    /// Returns time between repeats in seconds.
    pub fn delay_time(&self) -> f32 {
        self.delay_time
    }

    /// Sets how much of each repeat is fed back into the line.
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback;
    }

    /// Returns feedback factor.
    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    /// Sets gain of the delayed signal in the output.
    pub fn set_delay_gain(&mut self, gain: f32) {
        self.delay_gain = gain;
    }

    /// Returns gain of the delayed signal.
    pub fn delay_gain(&self) -> f32 {
        self.delay_gain
    }

    /// Sets gain of the unprocessed signal in the output.
    pub fn set_dry(&mut self, dry: f32) {
        self.dry = dry;
    }

    /// Returns gain of the unprocessed signal.
    pub fn dry(&self) -> f32 {
        self.dry
    }
}

impl EffectRenderTrait for Echo {
    fn render(&mut self, frames: &mut [(f32, f32)]) {
        for (left, right) in frames.iter_mut() {
            let delayed_left = self.left.feedback_tap(*left, self.delay_time, self.feedback);
            let delayed_right = self.right.feedback_tap(*right, self.delay_time, self.feedback);
            *left = *left * self.dry + delayed_left * self.delay_gain;
            *right = *right * self.dry + delayed_right * self.delay_gain;
        }
    }

    fn set_sample_rate(&mut self, sample_rate: u32) {
        if sample_rate == self.sample_rate() {
            return;
        }
        // Delay lines are rebuilt, pending repeats are dropped.
        let capacity = Self::capacity_for(self.max_delay, sample_rate);
        self.left = DelayLine::new(capacity, sample_rate);
        self.right = DelayLine::new(capacity, sample_rate);
    }
}

#[cfg(test)]
mod test {
    use crate::effects::{echo::Echo, EffectRenderTrait};

    #[test]
    fn test_repeats() {
        let mut echo = Echo::new(100, 1.0);
        echo.set_delay_time(0.1);
        echo.set_feedback(0.5);
        echo.set_delay_gain(1.0);

        let mut frames = vec![(0.0, 0.0); 40];
        frames[0] = (1.0, -1.0);
        echo.render(&mut frames);

        assert_eq!(frames[0], (1.0, -1.0));
        assert_eq!(frames[10], (1.0, -1.0));
        assert_eq!(frames[20], (0.5, -0.5));
        assert_eq!(frames[30], (0.25, -0.25));
        assert_eq!(frames[15], (0.0, 0.0));
    }

    #[test]
    fn test_repeats_follow_sample_rate() {
        let mut echo = Echo::default();
        echo.set_sample_rate(48000);
        echo.set_dry(0.0);
        echo.set_delay_gain(1.0);
        assert_eq!(echo.sample_rate(), 48000);

        let mut frames = vec![(0.0, 0.0); 13000];
        frames[0] = (1.0, 1.0);
        echo.render(&mut frames);

        // 250 ms at 48 kHz.
        let first = frames.iter().position(|f| f.0 != 0.0);
        assert_eq!(first, Some(12000));
    }

    #[test]
    fn test_dry_only() {
        let mut echo = Echo::default();
        echo.set_delay_gain(0.0);
        echo.set_dry(0.5);
        let mut frames = vec![(1.0, 1.0); 16];
        echo.render(&mut frames);
        assert!(frames.iter().all(|f| *f == (0.5, 0.5)));
    }
}

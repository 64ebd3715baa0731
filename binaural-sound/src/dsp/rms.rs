//! Root-mean-square envelope detector.

/// Sliding window RMS of a signal. Keeps squared samples of the window and their running sum, so
/// every step costs the same regardless of window size.
#[derive(Debug, Clone, PartialEq)]
pub struct RmsDetector {
    squares: Vec<f32>,
    cursor: usize,
    sum: f32,
}

impl Default for RmsDetector {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW)
    }
}

impl RmsDetector {
    /// Default window length in samples.
    pub const DEFAULT_WINDOW: usize = 64;

    /// Creates new detector with given window (in samples, at least one).
    pub fn new(window: usize) -> Self {
        Self {
            squares: vec![0.0; window.max(1)],
            cursor: 0,
            sum: 0.0,
        }
    }

    /// Returns window length in samples.
    pub fn window(&self) -> usize {
        self.squares.len()
    }

    /// Pushes one sample and returns RMS of the last `window` samples.
    pub fn feed(&mut self, sample: f32) -> f32 {
        let square = sample * sample;
        self.sum += square - self.squares[self.cursor];
        // Rounding of the running sum may dip slightly below zero on silence.
        self.sum = self.sum.max(0.0);
        self.squares[self.cursor] = square;
        self.cursor = (self.cursor + 1) % self.squares.len();
        (self.sum / self.squares.len() as f32).sqrt()
    }

    /// Returns current RMS without feeding a new sample.
    pub fn value(&self) -> f32 {
        (self.sum / self.squares.len() as f32).sqrt()
    }
}

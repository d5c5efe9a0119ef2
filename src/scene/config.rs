//! Canvas and animation configuration

use crate::types::{NumericError, positive};

use super::defaults;

/// Settings fixed for the lifetime of a [`Cell`](super::Cell).
#[derive(Debug, Clone, PartialEq)]
pub struct CellConfig {
    pub width: f64,
    pub height: f64,
    /// Number of ticks a goal-directed move is spread over
    pub frame_rate: f64,
    /// Maximum frames per second; `None` renders as fast as possible
    pub rate_limit: Option<f64>,
    /// Maintain the `_status` overlay text after each `display`
    pub status_overlay: bool,
}

impl Default for CellConfig {
    fn default() -> Self {
        Self {
            width: defaults::CANVAS_WIDTH,
            height: defaults::CANVAS_HEIGHT,
            frame_rate: defaults::FRAME_RATE,
            rate_limit: Some(defaults::RATE_LIMIT),
            status_overlay: true,
        }
    }
}

impl CellConfig {
    pub fn with_size(mut self, width: f64, height: f64) -> Result<Self, NumericError> {
        self.width = positive(width)?;
        self.height = positive(height)?;
        Ok(self)
    }

    pub fn with_frame_rate(mut self, frame_rate: f64) -> Result<Self, NumericError> {
        self.frame_rate = positive(frame_rate)?;
        Ok(self)
    }

    pub fn with_rate_limit(mut self, rate_limit: Option<f64>) -> Result<Self, NumericError> {
        self.rate_limit = rate_limit.map(positive).transpose()?;
        Ok(self)
    }

    pub fn with_status_overlay(mut self, enabled: bool) -> Self {
        self.status_overlay = enabled;
        self
    }

    /// Unthrottled and without overlay: what tests and offline renders want.
    pub fn headless() -> Self {
        Self {
            rate_limit: None,
            status_overlay: false,
            ..Self::default()
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::foundation::core::{Point, Rgb8};

/// Freehand brush: color and line width in canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Brush {
    /// Stroke color.
    pub color: Rgb8,
    width: f64,
}

impl Brush {
    /// Thinnest accepted line.
    pub const MIN_WIDTH: f64 = 1.0;
    /// Thickest accepted line.
    pub const MAX_WIDTH: f64 = 20.0;
    /// Width of a fresh brush.
    pub const DEFAULT_WIDTH: f64 = 5.0;

    /// Brush with `width` rounded to whole pixels and clamped into `MIN_WIDTH..=MAX_WIDTH`.
    pub fn new(color: Rgb8, width: f64) -> Self {
        Self {
            color,
            width: clamp_width(width),
        }
    }

    /// Line width in canvas pixels.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Same brush with another color.
    pub fn with_color(self, color: Rgb8) -> Self {
        Self { color, ..self }
    }

    /// Same brush with another (rounded, clamped) width.
    pub fn with_width(self, width: f64) -> Self {
        Self {
            width: clamp_width(width),
            ..self
        }
    }
}

impl Default for Brush {
    fn default() -> Self {
        Self::new(Rgb8::BLACK, Self::DEFAULT_WIDTH)
    }
}

fn clamp_width(width: f64) -> f64 {
    if width.is_nan() {
        return Brush::DEFAULT_WIDTH;
    }
    width.round().clamp(Brush::MIN_WIDTH, Brush::MAX_WIDTH)
}

/// When brush changes reach a stroke that is being drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeSampling {
    /// The brush is sampled per segment: a change mid-stroke applies to the segments that follow.
    #[default]
    PerSegment,
    /// The brush is sampled once at pointer-down and fixed for the whole stroke.
    PerStroke,
}

/// Consecutive points drawn with one brush.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeRun {
    /// Brush the run was drawn with.
    pub brush: Brush,
    /// Polyline in canvas pixels. A run that continues another one starts at that run's last
    /// point, so the line stays connected.
    pub points: Vec<Point>,
}

/// Finished, immutable freehand stroke.
#[derive(Clone, Debug, PartialEq)]
pub struct InkStroke {
    runs: Vec<StrokeRun>,
}

impl InkStroke {
    /// Runs in drawing order. Never empty.
    pub fn runs(&self) -> &[StrokeRun] {
        &self.runs
    }

    /// Brush the stroke started with.
    pub fn brush(&self) -> Brush {
        self.runs[0].brush
    }

    /// All recorded positions, without the points repeated at run joints.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.runs
            .iter()
            .enumerate()
            .flat_map(|(i, run)| run.points.iter().skip(usize::from(i > 0)).copied())
    }

    /// `true` for a click without movement; rendered as a round dot.
    pub fn is_dot(&self) -> bool {
        self.runs.len() == 1 && self.runs[0].points.len() == 1
    }
}

/// Recorder state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecorderState {
    /// No pointer is held down.
    Idle,
    /// A stroke is in progress.
    Recording,
}

/// Turns pointer drags into [`InkStroke`]s.
///
/// The recorder does not know about modes: its owner only forwards pointer events while drawing
/// is enabled.
#[derive(Clone, Debug, Default)]
pub struct InkRecorder {
    brush: Brush,
    sampling: StrokeSampling,
    live: Option<Vec<StrokeRun>>,
}

impl InkRecorder {
    /// Idle recorder with the given brush and sampling policy.
    pub fn new(brush: Brush, sampling: StrokeSampling) -> Self {
        Self {
            brush,
            sampling,
            live: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> RecorderState {
        if self.live.is_some() {
            RecorderState::Recording
        } else {
            RecorderState::Idle
        }
    }

    /// Brush used for new strokes (and, with per-segment sampling, new segments).
    pub fn brush(&self) -> Brush {
        self.brush
    }

    /// Sampling policy.
    pub fn sampling(&self) -> StrokeSampling {
        self.sampling
    }

    /// Replace the brush. Strokes already finished are not affected.
    pub fn set_brush(&mut self, brush: Brush) {
        self.brush = brush;
    }

    /// Start a stroke at `pos`. Ignored while a stroke is already in progress.
    pub fn pointer_down(&mut self, pos: Point) -> bool {
        if self.live.is_some() {
            return false;
        }
        self.live = Some(vec![StrokeRun {
            brush: self.brush,
            points: vec![pos],
        }]);
        tracing::trace!(x = pos.x, y = pos.y, "stroke started");
        true
    }

    /// Extend the stroke in progress. Returns `false` when idle.
    pub fn pointer_move(&mut self, pos: Point) -> bool {
        let sampling = self.sampling;
        let brush = self.brush;
        let Some(runs) = self.live.as_mut() else {
            return false;
        };
        let Some(last) = runs.last_mut() else {
            return false;
        };

        if sampling == StrokeSampling::PerSegment && last.brush != brush {
            let joint = last.points.last().copied().unwrap_or(pos);
            runs.push(StrokeRun {
                brush,
                points: vec![joint, pos],
            });
        } else {
            last.points.push(pos);
        }
        true
    }

    /// Finish the stroke in progress. Returns `None` when idle.
    pub fn pointer_up(&mut self) -> Option<InkStroke> {
        let runs = self.live.take()?;
        let stroke = InkStroke { runs };
        tracing::debug!(
            runs = stroke.runs.len(),
            points = stroke.points().count(),
            "stroke finalized"
        );
        Some(stroke)
    }

    /// Pointer left the canvas: finishes the stroke exactly like [`InkRecorder::pointer_up`].
    pub fn pointer_leave(&mut self) -> Option<InkStroke> {
        self.pointer_up()
    }

    /// Drop the stroke in progress without producing a layer.
    pub fn cancel(&mut self) -> bool {
        self.live.take().is_some()
    }

    /// Runs of the stroke in progress, for live feedback.
    pub fn live_runs(&self) -> Option<&[StrokeRun]> {
        self.live.as_deref()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/ink/recorder.rs"]
mod tests;

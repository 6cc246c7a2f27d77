//! Interactive drawing of boundary lines on a camera view.
//!
//! Frame decoding and the drawing UI are supplied by the caller through
//! [`VideoSource`] and [`LineAnnotator`]. The annotator is held through an
//! [`AnnotatorGuard`] for exactly as long as the drawing takes and is closed
//! when the guard drops, whether drawing succeeded or not.

use crate::calibration::lines::{BoundaryLine, BoundaryLines};
use crate::error::LabelError;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use tracing::info;

/// A greyscale image with intensities in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct GreyFrame {
    pub width: usize,
    pub height: usize,
    /// Row-major intensities
    pub pixels: Vec<f64>,
}

impl GreyFrame {
    /// Pixel-wise mean of two 8-bit frames, scaled to `[0, 1]`.
    pub fn average(a: &RawFrame, b: &RawFrame) -> Result<Self, LabelError> {
        if (a.width, a.height) != (b.width, b.height) || a.pixels.len() != b.pixels.len() {
            return Err(LabelError::Format(format!(
                "cannot average {}x{} frame with {}x{} frame",
                a.width, a.height, b.width, b.height
            )));
        }
        let pixels = a
            .pixels
            .iter()
            .zip(&b.pixels)
            .map(|(&p, &q)| (f64::from(p) + f64::from(q)) / 2.0 / 255.0)
            .collect();
        Ok(Self {
            width: a.width,
            height: a.height,
            pixels,
        })
    }
}

/// An 8-bit greyscale video frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

/// Access to a session's camera videos.
pub trait VideoSource {
    /// Videos recorded by `view`, in recording order.
    fn videos(&self, view: &str) -> Result<Vec<PathBuf>, LabelError>;

    /// Number of frames in `video`.
    fn frame_count(&self, video: &Path) -> Result<usize, LabelError>;

    /// Decode frame `index` (zero-based) of `video`.
    fn load_frame(&self, video: &Path, index: usize) -> Result<RawFrame, LabelError>;
}

/// An interactive line-drawing tool.
pub trait LineAnnotator {
    /// Let the user draw `count` lines on `frame`.
    fn draw_lines(&mut self, frame: &GreyFrame, count: usize)
        -> Result<Vec<BoundaryLine>, LabelError>;

    /// Write `frame` with `lines` overlaid to an image file.
    fn save_preview(
        &mut self,
        frame: &GreyFrame,
        lines: &[BoundaryLine],
        path: &Path,
    ) -> Result<(), LabelError>;

    /// Release windows and other UI resources.
    fn close(&mut self);
}

/// Scoped hold on a [`LineAnnotator`]; closes it on drop.
pub struct AnnotatorGuard<'a, A: LineAnnotator + ?Sized> {
    annotator: &'a mut A,
}

impl<'a, A: LineAnnotator + ?Sized> AnnotatorGuard<'a, A> {
    pub fn new(annotator: &'a mut A) -> Self {
        Self { annotator }
    }
}

impl<A: LineAnnotator + ?Sized> Deref for AnnotatorGuard<'_, A> {
    type Target = A;

    fn deref(&self) -> &A {
        self.annotator
    }
}

impl<A: LineAnnotator + ?Sized> DerefMut for AnnotatorGuard<'_, A> {
    fn deref_mut(&mut self) -> &mut A {
        self.annotator
    }
}

impl<A: LineAnnotator + ?Sized> Drop for AnnotatorGuard<'_, A> {
    fn drop(&mut self) {
        self.annotator.close();
    }
}

/// Have the user draw the `correct_left` and `correct_right` boundary lines
/// for `view` and save them under `processed_dir`.
///
/// The lines are drawn on the mean of the session's first and last video
/// frames. Returns `false` without doing anything if lines already exist and
/// `force` is not set.
pub fn draw_slit_thresholds<V, A>(
    processed_dir: &Path,
    view: &str,
    videos: &V,
    annotator: &mut A,
    force: bool,
) -> Result<bool, LabelError>
where
    V: VideoSource + ?Sized,
    A: LineAnnotator + ?Sized,
{
    let output = BoundaryLines::path(processed_dir, view);
    if output.exists() && !force {
        info!(view, "Slits drawn already");
        return Ok(false);
    }

    let files = videos.videos(view)?;
    let (Some(first), Some(last)) = (files.first(), files.last()) else {
        return Err(LabelError::NoVideos {
            view: view.to_string(),
        });
    };

    let first_frame = videos.load_frame(first, 0)?;
    let last_index = videos.frame_count(last)?.saturating_sub(1);
    let last_frame = videos.load_frame(last, last_index)?;
    let frame = GreyFrame::average(&first_frame, &last_frame)?;

    let lines = {
        let mut guard = AnnotatorGuard::new(annotator);
        let drawn = guard.draw_lines(&frame, 2)?;
        let [left, right] = drawn[..] else {
            return Err(LabelError::Format(format!(
                "expected 2 lines to be drawn, got {}",
                drawn.len()
            )));
        };
        guard.save_preview(&frame, &drawn, &output.with_extension("png"))?;
        BoundaryLines {
            correct_left: left,
            correct_right: right,
        }
    };

    lines.save(&output)?;
    info!(view, path = %output.display(), "Saved slit thresholds");
    Ok(true)
}

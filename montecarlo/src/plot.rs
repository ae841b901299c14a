//! Scatter images of sampled points.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use image::{ImageBuffer, ImageOutputFormat, Rgba, RgbaImage};

use crate::error::Result;
use crate::kernel::Observer;
use crate::problem::{ProblemKind, SamplePoint};

/// Number of points kept for drawing regardless of sample count.
pub const MAX_PLOTTED_POINTS: u64 = 10_000;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const HIT: Rgba<u8> = Rgba([34, 139, 34, 255]);
const MISS: Rgba<u8> = Rgba([200, 40, 40, 255]);
const OUTLINE: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Observer that keeps every `stride`-th sample.
#[derive(Debug)]
pub struct PointRecorder {
    stride: u64,
    seen: AtomicU64,
    points: Mutex<Vec<SamplePoint>>,
}

impl PointRecorder {
    /// Thin `total_samples` down to about [`MAX_PLOTTED_POINTS`].
    pub fn for_samples(total_samples: u64) -> Arc<Self> {
        Arc::new(Self {
            stride: (total_samples / MAX_PLOTTED_POINTS).max(1),
            seen: AtomicU64::new(0),
            points: Mutex::new(Vec::new()),
        })
    }

    pub fn record(&self, point: SamplePoint) {
        if self.seen.fetch_add(1, Ordering::Relaxed) % self.stride == 0 {
            self.points
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(point);
        }
    }

    pub fn observer(self: &Arc<Self>) -> Observer {
        let recorder = Arc::clone(self);
        Arc::new(move |point: SamplePoint| recorder.record(point))
    }

    pub fn points(&self) -> Vec<SamplePoint> {
        self.points
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Draw `points` on a `size` x `size` canvas covering the problem's domain,
/// with the boundary of the membership region in black.
pub fn render_scatter(points: &[SamplePoint], problem: ProblemKind, size: u32) -> RgbaImage {
    let size = size.max(2);
    let (low, high) = problem.domain();
    let span = high - low;
    let last = (size - 1) as f64;

    let to_px = |v: f64| (((v - low) / span) * last).round().clamp(0.0, last) as u32;
    // image rows grow downwards
    let to_py = |v: f64| (size - 1) - to_px(v);

    let mut img: RgbaImage = ImageBuffer::from_pixel(size, size, BACKGROUND);

    for col in 0..size {
        let x = low + span * col as f64 / last;
        match problem {
            ProblemKind::CircleMembership => {
                if x.abs() <= 1.0 {
                    let y = (1.0 - x * x).sqrt();
                    img.put_pixel(col, to_py(y), OUTLINE);
                    img.put_pixel(col, to_py(-y), OUTLINE);
                }
            }
            ProblemKind::CurveMembership => img.put_pixel(col, to_py(x * x), OUTLINE),
        }
    }

    for point in points {
        let colour = if point.hit { HIT } else { MISS };
        img.put_pixel(to_px(point.x), to_py(point.y), colour);
    }
    img
}

/// Render and write a PNG to `path`, whatever its extension.
pub fn save_scatter(
    points: &[SamplePoint],
    problem: ProblemKind,
    size: u32,
    path: impl AsRef<Path>,
) -> Result<()> {
    let img = render_scatter(points, problem, size);
    let mut writer = BufWriter::new(File::create(path)?);
    img.write_to(&mut writer, ImageOutputFormat::Png)?;
    writer.flush()?;
    Ok(())
}

//! Pure pixel statistics used by the analyzer.
//!
//! Both metrics sample a centred square so their cost is bounded regardless
//! of image size. They are cheap heuristics, not calibrated measurements.

use super::source::PixelSource;

fn gray(source: &dyn PixelSource, x: u32, y: u32) -> f64 {
    let [r, g, b, _] = source.rgba(x, y);
    (r as f64 + g as f64 + b as f64) / 3.0
}

/// Top-left corner and side of the centred square of at most `max_side` pixels.
pub fn centered_square(width: u32, height: u32, max_side: u32) -> (u32, u32, u32) {
    let side = max_side.min(width).min(height);
    ((width - side) / 2, (height - side) / 2, side)
}

/// Mean gradient magnitude to the right and lower neighbour, normalised.
///
/// Near 0 means blur or flat colour, near 1 a busy, high-frequency image.
/// A sample smaller than 2×2 has no neighbours and scores 0.
pub fn sharpness(source: &dyn PixelSource, max_side: u32, divisor: f64) -> f64 {
    let (x0, y0, side) = centered_square(source.width(), source.height(), max_side);
    if side < 2 {
        return 0.0;
    }

    let mut total = 0.0;
    for y in y0..y0 + side - 1 {
        for x in x0..x0 + side - 1 {
            let here = gray(source, x, y);
            let dx = gray(source, x + 1, y) - here;
            let dy = gray(source, x, y + 1) - here;
            total += (dx * dx + dy * dy).sqrt();
        }
    }
    let samples = (side as f64 - 1.0).powi(2);
    let mean = total / samples;
    log::trace!("sharpness sample {side}px: mean gradient {mean:.3}");
    (mean / divisor).clamp(0.0, 1.0)
}

/// Population standard deviation of grayscale values, normalised.
pub fn noise(source: &dyn PixelSource, max_side: u32, divisor: f64) -> f64 {
    let (x0, y0, side) = centered_square(source.width(), source.height(), max_side);
    if side == 0 {
        return 0.0;
    }

    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for y in y0..y0 + side {
        for x in x0..x0 + side {
            let v = gray(source, x, y);
            sum += v;
            sum_sq += v * v;
        }
    }
    let n = side as f64 * side as f64;
    let mean = sum / n;
    let variance = (sum_sq / n - mean * mean).max(0.0);
    let std_dev = variance.sqrt();
    log::trace!("noise sample {side}px: std dev {std_dev:.3}");
    (std_dev / divisor).clamp(0.0, 1.0)
}

/// True if any pixel on a grid of at most `max_samples × max_samples` points
/// is not fully opaque.
pub fn has_transparency(source: &dyn PixelSource, max_samples: u32) -> bool {
    if !source.has_alpha_channel() {
        return false;
    }
    let (w, h) = (source.width(), source.height());
    let step_x = w.div_ceil(max_samples).max(1);
    let step_y = h.div_ceil(max_samples).max(1);
    (0..h)
        .step_by(step_y as usize)
        .any(|y| (0..w).step_by(step_x as usize).any(|x| source.rgba(x, y)[3] < 255))
}

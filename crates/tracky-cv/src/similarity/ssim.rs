//! Structural similarity over interleaved 8-bit regions
//!
//! Uniform square window, sample covariance, statistics averaged over every
//! window position that lies fully inside the region, then averaged across
//! channels. Window sums come from summed-area tables so the cost does not
//! depend on the window size.

use super::SsimConfig;
use crate::region::PixelView;

/// Mean SSIM of two regions of identical shape.
pub fn structural_similarity(a: &PixelView<'_>, b: &PixelView<'_>, config: &SsimConfig) -> f64 {
    debug_assert_eq!(a.shape, b.shape);

    let width = a.shape.width.max(0) as usize;
    let height = a.shape.height.max(0) as usize;
    let channels = a.shape.channels.max(0) as usize;
    if width == 0 || height == 0 || channels == 0 {
        return 0.0;
    }

    let win = effective_window(config.win_size, width, height);
    let c1 = (config.k1 * config.data_range).powi(2);
    let c2 = (config.k2 * config.data_range).powi(2);

    let total: f64 = (0..channels)
        .map(|channel| {
            let tables = WindowSums::build(a.data, b.data, width, height, channels, channel);
            tables.mean_ssim(win, c1, c2)
        })
        .sum();

    total / channels as f64
}

/// Largest odd window no bigger than the configured size or the region.
pub fn effective_window(win_size: usize, width: usize, height: usize) -> usize {
    let mut win = win_size.min(width).min(height).max(1);
    if win % 2 == 0 {
        win -= 1;
    }
    win
}

/// Summed-area tables of x, y, x², y² and xy for one channel.
struct WindowSums {
    stride: usize,
    width: usize,
    height: usize,
    x: Vec<f64>,
    y: Vec<f64>,
    xx: Vec<f64>,
    yy: Vec<f64>,
    xy: Vec<f64>,
}

impl WindowSums {
    fn build(
        a: &[u8],
        b: &[u8],
        width: usize,
        height: usize,
        channels: usize,
        channel: usize,
    ) -> Self {
        let stride = width + 1;
        let len = stride * (height + 1);
        let mut sums = Self {
            stride,
            width,
            height,
            x: vec![0.0; len],
            y: vec![0.0; len],
            xx: vec![0.0; len],
            yy: vec![0.0; len],
            xy: vec![0.0; len],
        };

        for row in 0..height {
            let (mut rx, mut ry, mut rxx, mut ryy, mut rxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
            for col in 0..width {
                let idx = (row * width + col) * channels + channel;
                let xv = a[idx] as f64;
                let yv = b[idx] as f64;
                rx += xv;
                ry += yv;
                rxx += xv * xv;
                ryy += yv * yv;
                rxy += xv * yv;

                let above = row * stride + col + 1;
                let here = above + stride;
                sums.x[here] = sums.x[above] + rx;
                sums.y[here] = sums.y[above] + ry;
                sums.xx[here] = sums.xx[above] + rxx;
                sums.yy[here] = sums.yy[above] + ryy;
                sums.xy[here] = sums.xy[above] + rxy;
            }
        }
        sums
    }

    fn window(table: &[f64], stride: usize, top: usize, left: usize, win: usize) -> f64 {
        let bottom = top + win;
        let right = left + win;
        table[bottom * stride + right] - table[top * stride + right] - table[bottom * stride + left]
            + table[top * stride + left]
    }

    fn mean_ssim(&self, win: usize, c1: f64, c2: f64) -> f64 {
        let np = (win * win) as f64;
        // Sample covariance needs at least two samples per window
        let cov_norm = if win > 1 { np / (np - 1.0) } else { 1.0 };

        let rows = self.height - win + 1;
        let cols = self.width - win + 1;
        let mut total = 0.0;

        for top in 0..rows {
            for left in 0..cols {
                let ux = Self::window(&self.x, self.stride, top, left, win) / np;
                let uy = Self::window(&self.y, self.stride, top, left, win) / np;
                let uxx = Self::window(&self.xx, self.stride, top, left, win) / np;
                let uyy = Self::window(&self.yy, self.stride, top, left, win) / np;
                let uxy = Self::window(&self.xy, self.stride, top, left, win) / np;

                let vx = cov_norm * (uxx - ux * ux);
                let vy = cov_norm * (uyy - uy * uy);
                let vxy = cov_norm * (uxy - ux * uy);

                let numerator = (2.0 * ux * uy + c1) * (2.0 * vxy + c2);
                let denominator = (ux * ux + uy * uy + c1) * (vx + vy + c2);
                total += numerator / denominator;
            }
        }

        total / (rows * cols) as f64
    }
}

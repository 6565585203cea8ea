//! High-frequency detail transform.
//!
//! A 5-level 2-D Haar (db1) wavelet decomposition that zeroes the
//! approximation band at every level and reconstructs from the detail
//! bands only, leaving edges and fine texture while suppressing
//! low-frequency shading. Deterministic and parameterless beyond the
//! depth and basis.

use image::{DynamicImage, GrayImage, RgbImage};
use ndarray::Array2;

/// Decomposition depth used for face features.
pub const DECOMPOSITION_LEVELS: usize = 5;

const FRAC_1_SQRT_2: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// One decomposition level: the three detail bands plus the shape the
/// approximation had before this level split it (needed to trim the
/// symmetric padding on reconstruction).
struct Level {
    horizontal: Array2<f32>,
    vertical: Array2<f32>,
    diagonal: Array2<f32>,
    rows: usize,
    cols: usize,
}

/// Compute the detail image of a color crop: gray, normalized to [0, 1],
/// decomposed [`DECOMPOSITION_LEVELS`] deep, approximation zeroed,
/// reconstructed, and rescaled to u8. Output has the same extent as the
/// input. Negative reconstruction values saturate to zero rather than
/// wrapping modulo 256.
pub fn detail_image(img: &RgbImage) -> GrayImage {
    let gray = DynamicImage::ImageRgb8(img.clone()).to_luma8();
    let (w, h) = gray.dimensions();

    let mut approx = Array2::from_shape_fn((h as usize, w as usize), |(y, x)| {
        gray.get_pixel(x as u32, y as u32)[0] as f32 / 255.0
    });

    let mut levels = Vec::with_capacity(DECOMPOSITION_LEVELS);
    for _ in 0..DECOMPOSITION_LEVELS {
        let (rows, cols) = approx.dim();
        let (low, high) = split_cols(&approx);
        let (ca, cv) = split_rows(&low);
        let (ch, cd) = split_rows(&high);
        levels.push(Level {
            horizontal: ch,
            vertical: cv,
            diagonal: cd,
            rows,
            cols,
        });
        approx = ca;
    }

    // Suppress all low-frequency content: the coarsest approximation
    // contributes nothing to the reconstruction.
    approx.fill(0.0);

    for level in levels.iter().rev() {
        let low = merge_rows(&approx, &level.vertical);
        let high = merge_rows(&level.horizontal, &level.diagonal);
        approx = merge_cols(&low, &high, level.rows, level.cols);
    }

    GrayImage::from_fn(w, h, |x, y| {
        let v = approx[(y as usize, x as usize)] * 255.0;
        image::Luma([v.round().clamp(0.0, 255.0) as u8])
    })
}

/// Haar analysis along each row (axis 1): returns (low, high), each of
/// width `ceil(cols / 2)`. Odd widths are symmetrically padded by
/// repeating the last column.
fn split_cols(a: &Array2<f32>) -> (Array2<f32>, Array2<f32>) {
    let (rows, cols) = a.dim();
    let half = cols.div_ceil(2);
    let mut low = Array2::zeros((rows, half));
    let mut high = Array2::zeros((rows, half));
    for r in 0..rows {
        for k in 0..half {
            let x0 = a[(r, 2 * k)];
            let x1 = a[(r, (2 * k + 1).min(cols - 1))];
            low[(r, k)] = (x0 + x1) * FRAC_1_SQRT_2;
            high[(r, k)] = (x0 - x1) * FRAC_1_SQRT_2;
        }
    }
    (low, high)
}

/// Haar analysis along each column (axis 0): returns (low, high), each of
/// height `ceil(rows / 2)`.
fn split_rows(a: &Array2<f32>) -> (Array2<f32>, Array2<f32>) {
    let (rows, cols) = a.dim();
    let half = rows.div_ceil(2);
    let mut low = Array2::zeros((half, cols));
    let mut high = Array2::zeros((half, cols));
    for c in 0..cols {
        for k in 0..half {
            let x0 = a[(2 * k, c)];
            let x1 = a[((2 * k + 1).min(rows - 1), c)];
            low[(k, c)] = (x0 + x1) * FRAC_1_SQRT_2;
            high[(k, c)] = (x0 - x1) * FRAC_1_SQRT_2;
        }
    }
    (low, high)
}

/// Haar synthesis along columns (inverse of [`split_rows`]); output height
/// is twice the band height, trimmed later by [`merge_cols`]' caller via
/// the recorded level shape.
fn merge_rows(low: &Array2<f32>, high: &Array2<f32>) -> Array2<f32> {
    let (half, cols) = low.dim();
    let mut out = Array2::zeros((half * 2, cols));
    for c in 0..cols {
        for k in 0..half {
            let a = low[(k, c)];
            let d = high[(k, c)];
            out[(2 * k, c)] = (a + d) * FRAC_1_SQRT_2;
            out[(2 * k + 1, c)] = (a - d) * FRAC_1_SQRT_2;
        }
    }
    out
}

/// Haar synthesis along rows (inverse of [`split_cols`]), trimming the
/// result to the level's original `rows` x `cols` shape.
fn merge_cols(low: &Array2<f32>, high: &Array2<f32>, rows: usize, cols: usize) -> Array2<f32> {
    let (band_rows, half) = low.dim();
    let mut out = Array2::zeros((band_rows, half * 2));
    for r in 0..band_rows {
        for k in 0..half {
            let a = low[(r, k)];
            let d = high[(r, k)];
            out[(r, 2 * k)] = (a + d) * FRAC_1_SQRT_2;
            out[(r, 2 * k + 1)] = (a - d) * FRAC_1_SQRT_2;
        }
    }
    out.slice(ndarray::s![..rows, ..cols]).to_owned()
}

use std::path::Path;

use delaymap_core::io::ser::SER_HEADER_SIZE;
use delaymap_core::movie::{Movie, ReferenceTrace};
use ndarray::{Array1, Array2, Array3};
use tiff::encoder::{colortype, TiffEncoder};

/// Deterministic integer noise in `0..range` (64-bit LCG).
///
/// Integer-valued samples keep every sum exact, so results do not depend on
/// summation order.
pub fn integer_noise(len: usize, range: u64, seed: u64) -> Vec<f64> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 33) % range) as f64
        })
        .collect()
}

/// `values` circularly shifted right by `lag`: `out[t] = values[t - lag]`.
pub fn roll_series(values: &[f64], lag: isize) -> Vec<f64> {
    let n = values.len() as isize;
    (0..n)
        .map(|t| values[(t - lag).rem_euclid(n) as usize])
        .collect()
}

pub fn reference_from(values: &[f64]) -> ReferenceTrace {
    ReferenceTrace {
        values: Array1::from(values.to_vec()),
    }
}

/// Static per-pixel texture, integer valued.
pub fn texture(height: usize, width: usize, seed: u64) -> Array2<f64> {
    let values = integer_noise(height * width, 50, seed);
    Array2::from_shape_vec((height, width), values).expect("texture shape")
}

/// Movie whose pixel `(r, c)` carries `base + gain * signal[t - lags(r, c)]`.
pub fn lagged_movie(
    base: &Array2<f64>,
    signal: &[f64],
    gain: f64,
    lags: impl Fn(usize, usize) -> isize,
    label: &str,
) -> Movie {
    let (h, w) = base.dim();
    let t = signal.len();
    let mut data = Array3::<f64>::zeros((t, h, w));
    for row in 0..h {
        for col in 0..w {
            let trace = roll_series(signal, lags(row, col));
            for (frame, value) in trace.into_iter().enumerate() {
                data[[frame, row, col]] = base[[row, col]] + gain * value;
            }
        }
    }
    Movie::new(data, label)
}

/// Write a multi-page 16-bit grayscale TIFF, one page per frame.
pub fn write_tiff_stack(path: &Path, data: &Array3<f64>) {
    let (_, h, w) = data.dim();
    let file = std::fs::File::create(path).expect("create TIFF");
    let mut encoder = TiffEncoder::new(file).expect("TIFF encoder");
    for frame in data.outer_iter() {
        let pixels: Vec<u16> = frame.iter().map(|&v| v as u16).collect();
        encoder
            .write_image::<colortype::Gray16>(w as u32, h as u32, &pixels)
            .expect("write TIFF page");
    }
}

/// Build a SER file header for mono 8-bit frames.
///
/// Returns a `Vec<u8>` containing just the 178-byte header.
/// Append frame pixel data after calling this function.
pub fn build_ser_header(width: u32, height: u32, num_frames: usize) -> Vec<u8> {
    build_ser_header_full(width, height, 8, num_frames, 0)
}

/// Build a SER file header with configurable bit depth and color mode.
///
/// `color_id`: 0=MONO, 8=BAYER_RGGB, 100=RGB.
pub fn build_ser_header_full(
    width: u32,
    height: u32,
    bit_depth: u32,
    num_frames: usize,
    color_id: i32,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(SER_HEADER_SIZE);

    // Magic (14 bytes)
    buf.extend_from_slice(b"LUCAM-RECORDER");
    // LuID (4 bytes)
    buf.extend_from_slice(&0i32.to_le_bytes());
    // ColorID (4 bytes)
    buf.extend_from_slice(&color_id.to_le_bytes());
    // LittleEndian = 0 (little-endian per Siril convention)
    buf.extend_from_slice(&0i32.to_le_bytes());
    buf.extend_from_slice(&(width as i32).to_le_bytes());
    buf.extend_from_slice(&(height as i32).to_le_bytes());
    buf.extend_from_slice(&(bit_depth as i32).to_le_bytes());
    buf.extend_from_slice(&(num_frames as i32).to_le_bytes());
    // Observer, Instrument, Telescope (40 bytes each)
    buf.extend_from_slice(&[0u8; 120]);
    // DateTime, DateTimeUTC (8 bytes each)
    buf.extend_from_slice(&[0u8; 16]);

    assert_eq!(buf.len(), SER_HEADER_SIZE);
    buf
}

/// Build a complete synthetic mono 16-bit SER file from a movie.
pub fn build_ser_from_movie(data: &Array3<f64>) -> Vec<u8> {
    let (t, h, w) = data.dim();
    let mut buf = build_ser_header_full(w as u32, h as u32, 16, t, 0);
    for &v in data.iter() {
        buf.extend_from_slice(&(v as u16).to_le_bytes());
    }
    buf
}

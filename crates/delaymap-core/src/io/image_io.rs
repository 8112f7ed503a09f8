use std::fs::File;
use std::path::Path;

use image::{GrayImage, ImageFormat, Luma};
use ndarray::Array2;
use tiff::encoder::{colortype, TiffEncoder};

use crate::error::Result;

/// Save a 2-D array as a single-page 32-bit float grayscale TIFF, keeping the
/// values as they are (delays in seconds, raw intensities).
pub fn save_float_tiff(data: &Array2<f64>, path: &Path) -> Result<()> {
    let (h, w) = data.dim();
    let pixels: Vec<f32> = data.iter().map(|&v| v as f32).collect();

    let mut encoder = TiffEncoder::new(File::create(path)?)?;
    encoder.write_image::<colortype::Gray32Float>(w as u32, h as u32, &pixels)?;
    Ok(())
}

/// Load a single-page float TIFF written by [`save_float_tiff`].
pub fn load_float_tiff(path: &Path) -> Result<Array2<f64>> {
    use super::MovieSource;

    let movie = super::tiff_stack::TiffStack::open(path)?.read_movie()?;
    Ok(movie.data.index_axis_move(ndarray::Axis(0), 0))
}

/// Save values in [0.0, 1.0] as 8-bit grayscale PNG.
pub fn save_png(data: &Array2<f64>, path: &Path) -> Result<()> {
    let (h, w) = data.dim();

    let mut img = GrayImage::new(w as u32, h as u32);
    for ((row, col), &v) in data.indexed_iter() {
        let val = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        img.put_pixel(col as u32, row as u32, Luma([val]));
    }

    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use ndarray::{Array2, Array3, Axis};
use num_traits::ToPrimitive;
use tiff::decoder::{Decoder, DecodingResult, Limits};

use crate::error::{DelayMapError, Result};
use crate::movie::Movie;

use super::{source_label, MovieSource};

/// Multi-page grayscale TIFF, one page per frame.
#[derive(Clone, Debug)]
pub struct TiffStack {
    path: PathBuf,
    width: usize,
    height: usize,
    pages: usize,
}

impl TiffStack {
    /// Scan the page directory without decoding pixel data.
    /// Every page must have the dimensions of the first.
    pub fn open(path: &Path) -> Result<Self> {
        let mut decoder = open_decoder(path)?;
        let (width, height) = decoder.dimensions()?;
        let mut pages = 1;

        while decoder.more_images() {
            decoder.next_image()?;
            let (w, h) = decoder.dimensions()?;
            if (w, h) != (width, height) {
                return Err(DelayMapError::UnsupportedFormat(format!(
                    "{}: page {} is {}x{}, first page is {}x{}",
                    path.display(),
                    pages,
                    w,
                    h,
                    width,
                    height
                )));
            }
            pages += 1;
        }

        Ok(Self {
            path: path.to_path_buf(),
            width: width as usize,
            height: height as usize,
            pages,
        })
    }
}

impl MovieSource for TiffStack {
    fn label(&self) -> String {
        source_label(&self.path)
    }

    fn frame_count(&self) -> usize {
        self.pages
    }

    fn frame_shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    fn read_movie(&self) -> Result<Movie> {
        let (h, w) = (self.height, self.width);
        let mut decoder = open_decoder(&self.path)?;
        let mut data = Array3::<f64>::zeros((self.pages, h, w));

        for (page, mut frame) in data.axis_iter_mut(Axis(0)).enumerate() {
            if page > 0 {
                decoder.next_image()?;
            }
            let samples = decode_samples(decoder.read_image()?);
            if samples.len() != h * w {
                return Err(DelayMapError::UnsupportedFormat(format!(
                    "{}: page {} has {} samples for {}x{} pixels (only single-channel stacks are supported)",
                    self.path.display(),
                    page,
                    samples.len(),
                    w,
                    h
                )));
            }
            let page_data = Array2::from_shape_vec((h, w), samples)
                .map_err(|e| DelayMapError::UnsupportedFormat(e.to_string()))?;
            frame.assign(&page_data);
        }

        Ok(Movie::new(data, self.label()))
    }
}

fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>> {
    let file = File::open(path)?;
    Ok(Decoder::new(BufReader::new(file))?.with_limits(Limits::unlimited()))
}

fn decode_samples(result: DecodingResult) -> Vec<f64> {
    match result {
        DecodingResult::U8(v) => to_f64(v),
        DecodingResult::U16(v) => to_f64(v),
        DecodingResult::U32(v) => to_f64(v),
        DecodingResult::U64(v) => to_f64(v),
        DecodingResult::I8(v) => to_f64(v),
        DecodingResult::I16(v) => to_f64(v),
        DecodingResult::I32(v) => to_f64(v),
        DecodingResult::I64(v) => to_f64(v),
        DecodingResult::F32(v) => to_f64(v),
        DecodingResult::F64(v) => v,
    }
}

fn to_f64<T: ToPrimitive>(values: Vec<T>) -> Vec<f64> {
    values
        .into_iter()
        .map(|v| v.to_f64().unwrap_or(f64::NAN))
        .collect()
}

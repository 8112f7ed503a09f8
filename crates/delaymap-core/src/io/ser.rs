use std::fs::File;
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};
use memmap2::Mmap;
use ndarray::{Array3, ArrayViewMut2, Axis};

use crate::error::{DelayMapError, Result};
use crate::movie::Movie;

use super::{source_label, MovieSource};

pub const SER_HEADER_SIZE: usize = 178;
const SER_MAGIC: &[u8; 14] = b"LUCAM-RECORDER";
const SER_COLOR_MONO: i32 = 0;

/// SER file header (178 bytes).
#[derive(Clone, Debug)]
pub struct SerHeader {
    pub color_id: i32,
    pub little_endian: bool,
    pub width: u32,
    pub height: u32,
    pub pixel_depth: u32,
    pub frame_count: u32,
}

impl SerHeader {
    /// Bytes per sample (1 for 8-bit, 2 for 9-16 bit).
    pub fn bytes_per_sample(&self) -> usize {
        if self.pixel_depth <= 8 { 1 } else { 2 }
    }

    pub fn frame_byte_size(&self) -> Result<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|pixels| pixels.checked_mul(self.bytes_per_sample()))
            .ok_or_else(|| DelayMapError::InvalidSer("Frame size overflows".into()))
    }
}

/// Memory-mapped SER recording. Only mono data is accepted; raw sample values
/// are returned without rescaling.
pub struct SerReader {
    mmap: Mmap,
    path: PathBuf,
    pub header: SerHeader,
}

impl SerReader {
    /// Open a SER file and parse its header.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        // SAFETY: the mapping is read-only and the file is not modified while open.
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < SER_HEADER_SIZE {
            return Err(DelayMapError::InvalidSer(
                "File too small for SER header".into(),
            ));
        }

        if &mmap[0..14] != SER_MAGIC {
            return Err(DelayMapError::InvalidSer(
                "Missing LUCAM-RECORDER magic".into(),
            ));
        }

        let header = parse_header(&mmap[..SER_HEADER_SIZE])?;
        if header.color_id != SER_COLOR_MONO {
            return Err(DelayMapError::UnsupportedFormat(format!(
                "{}: SER color id {} (only mono recordings are supported)",
                path.display(),
                header.color_id
            )));
        }

        let expected_size = header
            .frame_byte_size()?
            .checked_mul(header.frame_count as usize)
            .and_then(|bytes| bytes.checked_add(SER_HEADER_SIZE))
            .ok_or_else(|| DelayMapError::InvalidSer("Data size overflows".into()))?;
        if mmap.len() < expected_size {
            return Err(DelayMapError::InvalidSer(format!(
                "File truncated: expected at least {} bytes, got {}",
                expected_size,
                mmap.len()
            )));
        }

        Ok(Self {
            mmap,
            path: path.to_path_buf(),
            header,
        })
    }

    /// Raw bytes of one frame, borrowed from the mapping.
    fn frame_raw(&self, index: usize, frame_bytes: usize) -> &[u8] {
        let offset = SER_HEADER_SIZE + index * frame_bytes;
        &self.mmap[offset..offset + frame_bytes]
    }
}

impl MovieSource for SerReader {
    fn label(&self) -> String {
        source_label(&self.path)
    }

    fn frame_count(&self) -> usize {
        self.header.frame_count as usize
    }

    fn frame_shape(&self) -> (usize, usize) {
        (self.header.height as usize, self.header.width as usize)
    }

    fn read_movie(&self) -> Result<Movie> {
        let (h, w) = self.frame_shape();
        let frame_bytes = self.header.frame_byte_size()?;
        let bytes_per_sample = self.header.bytes_per_sample();
        let little_endian = self.header.little_endian;

        let mut data = Array3::<f64>::zeros((self.frame_count(), h, w));
        for (index, frame) in data.axis_iter_mut(Axis(0)).enumerate() {
            decode_mono_plane(
                self.frame_raw(index, frame_bytes),
                frame,
                bytes_per_sample,
                little_endian,
            );
        }

        Ok(Movie::new(data, self.label()))
    }
}

fn parse_header(buf: &[u8]) -> Result<SerHeader> {
    let mut cursor = std::io::Cursor::new(&buf[14..]); // skip magic

    let _lu_id = cursor.read_i32::<LittleEndian>()?;
    let color_id = cursor.read_i32::<LittleEndian>()?;
    let le_flag = cursor.read_i32::<LittleEndian>()?;
    let width = cursor.read_i32::<LittleEndian>()?;
    let height = cursor.read_i32::<LittleEndian>()?;
    let pixel_depth = cursor.read_i32::<LittleEndian>()?;
    let frame_count = cursor.read_i32::<LittleEndian>()?;

    if width <= 0 || height <= 0 || frame_count < 0 {
        return Err(DelayMapError::InvalidDimensions {
            frames: frame_count.max(0) as usize,
            width: width.max(0) as usize,
            height: height.max(0) as usize,
        });
    }
    if !(1..=16).contains(&pixel_depth) {
        return Err(DelayMapError::InvalidSer(format!(
            "Unsupported pixel depth {pixel_depth}"
        )));
    }

    // SER spec: LittleEndian field = 0 means big-endian pixel data,
    // but many writers (including FireCapture) use 0 for little-endian.
    // Follow Siril's convention: treat 0 as little-endian.
    let little_endian = le_flag != 1;

    Ok(SerHeader {
        color_id,
        little_endian,
        width: width as u32,
        height: height as u32,
        pixel_depth: pixel_depth as u32,
        frame_count: frame_count as u32,
    })
}

fn decode_mono_plane(
    raw: &[u8],
    mut frame: ArrayViewMut2<f64>,
    bytes_per_sample: usize,
    little_endian: bool,
) {
    let samples = raw.chunks_exact(bytes_per_sample);
    for (dst, sample) in frame.iter_mut().zip(samples) {
        *dst = match sample {
            [b] => *b as f64,
            [a, b] if little_endian => u16::from_le_bytes([*a, *b]) as f64,
            [a, b] => u16::from_be_bytes([*a, *b]) as f64,
            _ => unreachable!("chunks_exact yields 1- or 2-byte samples"),
        };
    }
}

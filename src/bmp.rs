//! Indexed-color Windows bitmap encoder.
//!
//! Layout of the produced byte stream:
//! - BITMAPFILEHEADER (14 bytes): `BM`, file size, two reserved words, pixel offset
//! - BITMAPINFOHEADER (40 bytes): header size, width, height (positive, so rows
//!   go bottom-up), planes, bit count, compression (none), image size,
//!   resolution (zero), colors used, colors important (zero)
//! - color table: 4 bytes per entry, blue / green / red / zero
//! - pixel rows, bottom row first, each padded to a multiple of 4 bytes
//!
//! All multi-byte fields are little-endian.

use crate::error::{Error, Result};

pub const FILE_HEADER_SIZE: usize = 14;
pub const INFO_HEADER_SIZE: usize = 40;
pub const HEADER_SIZE: usize = FILE_HEADER_SIZE + INFO_HEADER_SIZE;

const SIGNATURE: &[u8; 2] = b"BM";
const MAX_PALETTE_SIZE: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
	pub red: u8,
	pub green: u8,
	pub blue: u8,
}

impl Color {
	pub const fn new(red: u8, green: u8, blue: u8) -> Color {
		Color { red, green, blue }
	}
}

/// Bits needed per pixel to address a palette of `palette_size` colors.
pub fn bits_per_pixel(palette_size: usize) -> Result<u16> {
	match palette_size {
		2 => Ok(1),
		3..=4 => Ok(2),
		5..=15 => Ok(4),
		16..=MAX_PALETTE_SIZE => Ok(8),
		n => Err(Error::PaletteSize(n)),
	}
}

/// Bytes per stored row, padded to a 4-byte boundary.
pub fn row_byte_size(width: u32, bits_per_pixel: u16) -> usize {
	let bits = width as usize * bits_per_pixel as usize;
	let bytes = (bits + 7) / 8;
	(bytes + 3) / 4 * 4
}

/// Header fields as they appear in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapHeader {
	pub bf_size: u32,
	pub bf_off_bits: u32,
	pub bi_width: i32,
	pub bi_height: i32,
	pub bi_planes: u16,
	pub bi_bit_count: u16,
	pub bi_compression: u32,
	pub bi_size_image: u32,
	pub bi_clr_used: u32,
	pub bi_clr_important: u32,
}

impl BitmapHeader {
	fn write(&self, out: &mut Vec<u8>) {
		let mut header = [0u8; HEADER_SIZE];
		header[0..2].copy_from_slice(SIGNATURE);
		header[2..6].copy_from_slice(&self.bf_size.to_le_bytes());
		// 6..10: two reserved words
		header[10..14].copy_from_slice(&self.bf_off_bits.to_le_bytes());

		header[14..18].copy_from_slice(&(INFO_HEADER_SIZE as u32).to_le_bytes());
		header[18..22].copy_from_slice(&self.bi_width.to_le_bytes());
		header[22..26].copy_from_slice(&self.bi_height.to_le_bytes());
		header[26..28].copy_from_slice(&self.bi_planes.to_le_bytes());
		header[28..30].copy_from_slice(&self.bi_bit_count.to_le_bytes());
		header[30..34].copy_from_slice(&self.bi_compression.to_le_bytes());
		header[34..38].copy_from_slice(&self.bi_size_image.to_le_bytes());
		// 38..46: horizontal and vertical resolution, left at zero
		header[46..50].copy_from_slice(&self.bi_clr_used.to_le_bytes());
		header[50..54].copy_from_slice(&self.bi_clr_important.to_le_bytes());
		out.extend_from_slice(&header);
	}

	/// Reads the headers back from the start of an encoded file.
	pub fn parse(bytes: &[u8]) -> Option<BitmapHeader> {
		if bytes.len() < HEADER_SIZE || &bytes[0..2] != SIGNATURE {
			return None;
		}
		let u16_at = |i: usize| u16::from_le_bytes([bytes[i], bytes[i + 1]]);
		let u32_at = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
		if u32_at(14) as usize != INFO_HEADER_SIZE {
			return None;
		}
		Some(BitmapHeader {
			bf_size: u32_at(2),
			bf_off_bits: u32_at(10),
			bi_width: u32_at(18) as i32,
			bi_height: u32_at(22) as i32,
			bi_planes: u16_at(26),
			bi_bit_count: u16_at(28),
			bi_compression: u32_at(30),
			bi_size_image: u32_at(34),
			bi_clr_used: u32_at(46),
			bi_clr_important: u32_at(50),
		})
	}
}

/// Encodes a `width` × `height` image whose `pixels` are palette indices
/// listed row by row, top row first.
pub fn encode(width: u32, height: u32, palette: &[Color], pixels: &[u8]) -> Result<Vec<u8>> {
	let bits = bits_per_pixel(palette.len())?;
	if width == 0 || height == 0 {
		return Err(Error::EmptyImage);
	}
	let expected = width as usize * height as usize;
	if pixels.len() != expected {
		return Err(Error::PixelCount { expected, actual: pixels.len() });
	}
	if let Some(&index) = pixels.iter().find(|&&i| i as usize >= palette.len()) {
		return Err(Error::PaletteIndex { index, palette_size: palette.len() });
	}

	let row_size = row_byte_size(width, bits);
	let palette_bytes = palette.len() * 4;
	let image_size = row_size * height as usize;
	let file_size = HEADER_SIZE + palette_bytes + image_size;
	let too_large = || Error::ImageTooLarge { width, height };
	let header = BitmapHeader {
		bf_size: u32::try_from(file_size).map_err(|_| too_large())?,
		bf_off_bits: (HEADER_SIZE + palette_bytes) as u32,
		bi_width: i32::try_from(width).map_err(|_| too_large())?,
		bi_height: i32::try_from(height).map_err(|_| too_large())?,
		bi_planes: 1,
		bi_bit_count: bits,
		bi_compression: 0,
		bi_size_image: image_size as u32,
		bi_clr_used: palette.len() as u32,
		bi_clr_important: 0,
	};

	let mut out = Vec::with_capacity(file_size);
	header.write(&mut out);
	for color in palette {
		out.extend_from_slice(&[color.blue, color.green, color.red, 0]);
	}

	let bits = bits as usize;
	for row in pixels.chunks_exact(width as usize).rev() {
		let start = out.len();
		out.resize(start + row_size, 0);
		let line = &mut out[start..];
		for (i, &index) in row.iter().enumerate() {
			let bit = i * bits;
			line[bit / 8] |= index << (8 - bits - bit % 8);
		}
	}
	Ok(out)
}

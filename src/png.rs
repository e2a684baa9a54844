//! PNG framing, header, and scanline layout.
//!
//! * [Portable Network Graphics Specification (Second Edition)][png-spec]
//!
//! [png-spec]: https://www.w3.org/TR/2003/REC-PNG-20031110/
//!
//! A PNG data stream is an 8 byte signature followed by "chunks". Each chunk
//! is a big-endian `u32` length, a 4 byte type tag, that many bytes of data,
//! and a CRC-32 of the type and data. The chunks this crate acts on are:
//!
//! * **`IHDR`** - always first. Dimensions, pixel format, and if the image is
//!   interlaced.
//! * **`PLTE`** - the palette of an indexed color image.
//! * **`tRNS`** - transparency info, applied when expanding pixels to RGBA.
//! * **`IDAT`** - one or more chunks that together form a single zlib stream.
//! * **`IEND`** - the last chunk. Seeing it proves the data wasn't truncated.
//!
//! Other chunks are ancillary and skipped, unless their type marks them as
//! critical, in which case we can't safely show the image at all.
//!
//! Inflating the `IDAT` stream gives *filtered* data: a series of lines, each
//! with a filter type byte on the front. Unfiltering works in place. For
//! interlaced images the filtered data is seven "reduced images" one after the
//! other, and each reduced image is unfiltered on its own.

use core::fmt::{Debug, Write};

use crate::error::HeaderError;

mod crc32;
pub(crate) use crc32::*;

mod expand;
pub(crate) use expand::*;

mod unfilter;
pub(crate) use unfilter::*;


/// The 8 bytes every PNG data stream starts with.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Checks if the PNG's initial 8 bytes are correct.
#[inline]
#[must_use]
pub const fn is_png_signature(bytes: &[u8]) -> bool {
  matches!(bytes, [137, 80, 78, 71, 13, 10, 26, 10, ..])
}

/// A chunk's four byte type tag.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ChunkType(pub [u8; 4]);
#[allow(nonstandard_style)]
impl ChunkType {
  pub const IHDR: Self = Self(*b"IHDR");
  pub const PLTE: Self = Self(*b"PLTE");
  pub const IDAT: Self = Self(*b"IDAT");
  pub const IEND: Self = Self(*b"IEND");
  pub const tRNS: Self = Self(*b"tRNS");

  /// Critical chunks have an uppercase first letter.
  ///
  /// A decoder that meets an unknown critical chunk can't display the image.
  #[inline]
  #[must_use]
  pub const fn is_critical(self) -> bool {
    self.0[0] & 0b0010_0000 == 0
  }
}
impl Debug for ChunkType {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    for b in self.0 {
      if b.is_ascii_alphabetic() {
        f.write_char(b as char)?;
      } else {
        write!(f, "\\x{b:02X}")?;
      }
    }
    Ok(())
  }
}

/// The types of color that PNG supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PngColorType {
  /// Greyscale
  Y = 0,
  /// Red, Green, Blue
  RGB = 2,
  /// Index into a palette.
  ///
  /// The palette will have RGB8 data. There may optionally be a transparency
  /// chunk.
  Index = 3,
  /// Greyscale + Alpha
  YA = 4,
  /// Red, Green, Blue, Alpha
  RGBA = 6,
}
impl PngColorType {
  /// The number of channels in this type of color.
  #[inline]
  #[must_use]
  pub const fn channel_count(self) -> usize {
    match self {
      Self::Y | Self::Index => 1,
      Self::YA => 2,
      Self::RGB => 3,
      Self::RGBA => 4,
    }
  }

  /// If PNG allows this color type with the given bit depth.
  #[inline]
  #[must_use]
  pub const fn allows_bit_depth(self, bit_depth: u8) -> bool {
    match self {
      Self::Y => matches!(bit_depth, 1 | 2 | 4 | 8 | 16),
      Self::Index => matches!(bit_depth, 1 | 2 | 4 | 8),
      Self::RGB | Self::YA | Self::RGBA => matches!(bit_depth, 8 | 16),
    }
  }
}
impl TryFrom<u8> for PngColorType {
  type Error = HeaderError;
  #[inline]
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Ok(match value {
      0 => Self::Y,
      2 => Self::RGB,
      3 => Self::Index,
      4 => Self::YA,
      6 => Self::RGBA,
      _ => return Err(HeaderError::IllegalHeader),
    })
  }
}

/// Image Header, parsed from the `IHDR` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PngHeader {
  /// width in pixels
  pub width: u32,
  /// height in pixels
  pub height: u32,
  /// bits per channel
  pub bit_depth: u8,
  /// pixel color type
  pub color_type: PngColorType,
  /// if the image data is stored interlaced (Adam7).
  pub is_interlaced: bool,
}
impl TryFrom<&[u8]> for PngHeader {
  type Error = HeaderError;
  /// Parses the 13 data bytes of an `IHDR` chunk.
  fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
    let &[w0, w1, w2, w3, h0, h1, h2, h3, bit_depth, color_type, compression_method, filter_method, interlace_method] =
      value
    else {
      return Err(HeaderError::FirstChunkNotIhdr);
    };
    let width = u32::from_be_bytes([w0, w1, w2, w3]);
    let height = u32::from_be_bytes([h0, h1, h2, h3]);
    if width == 0 || height == 0 {
      return Err(HeaderError::ZeroDimension);
    }
    // PNG four byte integers are limited to 2^31-1
    if width > i32::MAX as u32 || height > i32::MAX as u32 {
      return Err(HeaderError::IllegalHeader);
    }
    let color_type = PngColorType::try_from(color_type)?;
    if !color_type.allows_bit_depth(bit_depth) || compression_method != 0 || filter_method != 0 {
      return Err(HeaderError::IllegalHeader);
    }
    let is_interlaced = match interlace_method {
      0 => false,
      1 => true,
      _ => return Err(HeaderError::IllegalHeader),
    };
    Ok(Self { width, height, bit_depth, color_type, is_interlaced })
  }
}
impl PngHeader {
  #[inline]
  #[must_use]
  pub const fn bits_per_pixel(&self) -> usize {
    (self.bit_depth as usize) * self.color_type.channel_count()
  }

  /// Filtering works per byte of a pixel when pixels are more than 1 byte,
  /// and per byte when pixels are 1 byte or less.
  #[inline]
  #[must_use]
  pub const fn filter_chunk_size(&self) -> usize {
    let bytes = self.bits_per_pixel() / 8;
    if bytes == 0 {
      1
    } else {
      bytes
    }
  }

  /// Bytes in one filtered line of a (reduced) image `width` pixels wide:
  /// the filter type byte plus the packed pixel data, rounded up to a byte.
  #[inline]
  #[must_use]
  pub fn bytes_per_filterline(&self, width: u32) -> Option<usize> {
    let bits = self.bits_per_pixel().checked_mul(width as usize)?;
    Some(bits / 8 + usize::from(bits % 8 != 0) + 1)
  }

  /// The reduced images the filtered data is made of, in storage order.
  ///
  /// A non-interlaced image is a single "pass" covering the full image.
  pub fn passes(&self) -> impl Iterator<Item = (Pass, u32, u32)> {
    let (width, height) = (self.width, self.height);
    let passes: &'static [Pass] = if self.is_interlaced { &ADAM7 } else { &[Pass::FULL] };
    passes.iter().map(move |&pass| {
      let (w, h) = pass.reduced_dimensions(width, height);
      (pass, w, h)
    })
  }

  /// Gets the buffer size required to hold all of the inflated (still
  /// filtered) image data, or `None` on overflow.
  pub fn filtered_len(&self) -> Option<usize> {
    let mut total = 0_usize;
    for (_, w, h) in self.passes() {
      if w == 0 || h == 0 {
        continue;
      }
      total = total.checked_add(self.bytes_per_filterline(w)?.checked_mul(h as usize)?)?;
    }
    Some(total)
  }
}

/// Where one reduced image's pixels land in the full image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pass {
  x0: u32,
  y0: u32,
  dx: u32,
  dy: u32,
}
impl Pass {
  /// The whole, non-interlaced image.
  pub const FULL: Self = Self { x0: 0, y0: 0, dx: 1, dy: 1 };

  /// Size of this pass's reduced image within a `full_width` by
  /// `full_height` image. Either side can be 0 for small images.
  #[inline]
  #[must_use]
  pub const fn reduced_dimensions(self, full_width: u32, full_height: u32) -> (u32, u32) {
    const fn span(full: u32, start: u32, step: u32) -> u32 {
      if full <= start {
        0
      } else {
        (full - start + step - 1) / step
      }
    }
    (span(full_width, self.x0, self.dx), span(full_height, self.y0, self.dy))
  }

  /// Converts a reduced image location into the full image location.
  #[inline]
  #[must_use]
  pub const fn full_pos(self, reduced_x: u32, reduced_y: u32) -> (u32, u32) {
    (self.x0 + reduced_x * self.dx, self.y0 + reduced_y * self.dy)
  }
}

/// The seven Adam7 passes.
///
/// ```text
/// 1 6 4 6 2 6 4 6
/// 7 7 7 7 7 7 7 7
/// 5 6 5 6 5 6 5 6
/// 7 7 7 7 7 7 7 7
/// 3 6 4 6 3 6 4 6
/// 7 7 7 7 7 7 7 7
/// 5 6 5 6 5 6 5 6
/// 7 7 7 7 7 7 7 7
/// ```
pub const ADAM7: [Pass; 7] = [
  Pass { x0: 0, y0: 0, dx: 8, dy: 8 },
  Pass { x0: 4, y0: 0, dx: 8, dy: 8 },
  Pass { x0: 0, y0: 4, dx: 4, dy: 8 },
  Pass { x0: 2, y0: 0, dx: 4, dy: 4 },
  Pass { x0: 0, y0: 2, dx: 2, dy: 4 },
  Pass { x0: 1, y0: 0, dx: 2, dy: 2 },
  Pass { x0: 0, y0: 1, dx: 1, dy: 2 },
];

/// Given the dimensions of the full image, computes the size of each of the
/// seven reduced images of its interlaced form.
#[inline]
#[must_use]
pub const fn reduced_image_dimensions(full_width: u32, full_height: u32) -> [(u32, u32); 7] {
  let mut out = [(0, 0); 7];
  let mut i = 0;
  while i < 7 {
    out[i] = ADAM7[i].reduced_dimensions(full_width, full_height);
    i += 1;
  }
  out
}

use bitfrob::u8_replicate_bits;

use super::*;

use crate::pixels::Rgba8;

/// Transparency info from a `tRNS` chunk.
///
/// Gray and RGB keys are in the image's own sample values, not scaled to 8
/// bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transparency<'t> {
  Opaque,
  Gray(u16),
  Rgb([u16; 3]),
  /// Alpha per palette entry. Entries past the end are fully opaque.
  Alphas(&'t [u8]),
}
impl<'t> Transparency<'t> {
  /// `None` when the chunk's data doesn't suit the color type.
  #[must_use]
  pub fn parse(color_type: PngColorType, data: &'t [u8]) -> Option<Self> {
    match (color_type, data) {
      (PngColorType::Y, [y0, y1]) => Some(Self::Gray(u16::from_be_bytes([*y0, *y1]))),
      (PngColorType::RGB, [r0, r1, g0, g1, b0, b1]) => Some(Self::Rgb([
        u16::from_be_bytes([*r0, *r1]),
        u16::from_be_bytes([*g0, *g1]),
        u16::from_be_bytes([*b0, *b1]),
      ])),
      (PngColorType::Index, alphas) if alphas.len() <= 256 => Some(Self::Alphas(alphas)),
      _ => None,
    }
  }
}

/// Turns one pixel's unfiltered bytes into [`Rgba8`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct Expander<'a> {
  bit_depth: u8,
  color_type: PngColorType,
  palette: &'a [[u8; 3]],
  transparency: Transparency<'a>,
}
impl<'a> Expander<'a> {
  #[must_use]
  pub fn new(header: &PngHeader, palette: &'a [[u8; 3]], transparency: Transparency<'a>) -> Self {
    // a key above the bit depth is kept as is, so it never matches a sample
    Self { bit_depth: header.bit_depth, color_type: header.color_type, palette, transparency }
  }

  /// `data` is exactly one pixel, as sent by the unfilter step.
  #[must_use]
  pub fn rgba(&self, data: &[u8]) -> Rgba8 {
    let depth = self.bit_depth;
    match self.color_type {
      PngColorType::Y => {
        let y = channel(depth, data, 0);
        let a = if self.transparency == Transparency::Gray(raw(depth, data, 0)) { 0 } else { 255 };
        Rgba8 { r: y, g: y, b: y, a }
      }
      PngColorType::RGB => {
        let key = [raw(depth, data, 0), raw(depth, data, 1), raw(depth, data, 2)];
        let a = if self.transparency == Transparency::Rgb(key) { 0 } else { 255 };
        Rgba8 { r: channel(depth, data, 0), g: channel(depth, data, 1), b: channel(depth, data, 2), a }
      }
      PngColorType::Index => {
        let i = usize::from(data[0]);
        // an index past the palette is shown as opaque black
        let [r, g, b] = self.palette.get(i).copied().unwrap_or_default();
        let a = match self.transparency {
          Transparency::Alphas(alphas) => alphas.get(i).copied().unwrap_or(255),
          _ => 255,
        };
        Rgba8 { r, g, b, a }
      }
      PngColorType::YA => {
        let y = channel(depth, data, 0);
        Rgba8 { r: y, g: y, b: y, a: channel(depth, data, 1) }
      }
      PngColorType::RGBA => Rgba8 {
        r: channel(depth, data, 0),
        g: channel(depth, data, 1),
        b: channel(depth, data, 2),
        a: channel(depth, data, 3),
      },
    }
  }
}

/// The `i`th sample as stored.
#[inline]
fn raw(depth: u8, data: &[u8], i: usize) -> u16 {
  if depth == 16 {
    u16::from_be_bytes([data[2 * i], data[2 * i + 1]])
  } else {
    u16::from(data[i])
  }
}

/// The `i`th sample scaled to 8 bits.
#[inline]
fn channel(depth: u8, data: &[u8], i: usize) -> u8 {
  match depth {
    16 => data[2 * i],
    8 => data[i],
    n => u8_replicate_bits(u32::from(n), data[i]),
  }
}

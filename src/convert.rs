//! Converts decoded RGBA pixels into framebuffer order, in place.
//!
//! For every 4-byte record the red and blue channels trade places, green stays
//! put, and the alpha byte is set to zero. The destination surface does no
//! alpha blending and uses that byte for its own purposes, so the
//! transparency computed by the decoder is deliberately thrown away here.
//!
//! Because alpha is cleared, converting twice is **not** a round trip: the
//! color channels return to their original positions but alpha stays 0.

use crate::pixels::{Bgrx8, Rgba8};

/// Rewrites each pixel from RGBA to BGRX in place.
///
/// The return value is the same memory, now viewed as [`Bgrx8`].
#[inline]
pub fn rgba_to_bgrx(pixels: &mut [Rgba8]) -> &mut [Bgrx8] {
  for p in pixels.iter_mut() {
    let Rgba8 { r, g, b, a: _ } = *p;
    *p = Rgba8 { r: b, g, b: r, a: 0 };
  }
  bytemuck::cast_slice_mut(pixels)
}

/// Byte-level form of [`rgba_to_bgrx`].
///
/// ## Panics
/// * If `buffer.len()` is not a multiple of 4. Passing such a buffer is a
///   caller bug, never a runtime condition.
#[inline]
#[track_caller]
pub fn convert(buffer: &mut [u8]) {
  assert!(buffer.len() % 4 == 0, "pixel buffer length {} is not a multiple of 4", buffer.len());
  rgba_to_bgrx(bytemuck::cast_slice_mut(buffer));
}

//! Pixel records on both sides of the converter.
//!
//! * The decoder's canonical output is [`Rgba8`]: red, green, blue, alpha, one
//!   byte each, in that order in memory.
//! * The framebuffer wants [`Bgrx8`]: blue, green, red, then a byte the
//!   compositor treats as its own control byte, which we always leave zeroed.
//!
//! Both are 4 bytes with an alignment of 1, so a byte buffer whose length is a
//! multiple of 4 can be viewed as either one with [`bytemuck`].

use bytemuck::{Pod, Zeroable};

/// Decoder output: an 8-bits per channel sRGB RGBA pixel.
pub type Rgba8 = pixel_formats::r8g8b8a8_Srgb;

/// Framebuffer input: an 8-bits per channel BGR pixel plus a cleared byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Bgrx8 {
  pub b: u8,
  pub g: u8,
  pub r: u8,
  /// Always 0 after conversion.
  pub x: u8,
}
impl From<Rgba8> for Bgrx8 {
  /// Reorders the color channels and discards alpha.
  #[inline]
  fn from(Rgba8 { r, g, b, a: _ }: Rgba8) -> Self {
    Self { b, g, r, x: 0 }
  }
}

#[test]
fn test_pixel_layouts() {
  use core::mem::{align_of, size_of};
  assert_eq!(size_of::<Rgba8>(), 4);
  assert_eq!(align_of::<Rgba8>(), 1);
  assert_eq!(size_of::<Bgrx8>(), 4);
  assert_eq!(align_of::<Bgrx8>(), 1);
  let rgba = Rgba8 { r: 1, g: 2, b: 3, a: 4 };
  assert_eq!(bytemuck::bytes_of(&rgba), &[1, 2, 3, 4]);
  assert_eq!(Bgrx8::from(rgba), Bgrx8 { b: 3, g: 2, r: 1, x: 0 });
}

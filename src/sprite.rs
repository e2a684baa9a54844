//! A decoded, framebuffer-ready image, and the trait a framebuffer implements
//! to draw one.

use alloc::vec::Vec;

use crate::{
  convert::convert,
  decode::{DecodeContext, Geometry},
  error::PainterError,
  limits::DecodeOptions,
  pixels::Bgrx8,
  source::ImageSource,
};

/// An image in [`Bgrx8`] form, row-major with no padding between rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sprite {
  geometry: Geometry,
  bytes: Vec<u8>,
}
impl Sprite {
  /// Loads with the default [`DecodeOptions`].
  #[inline]
  pub fn load<S: ImageSource>(source: S) -> Result<Self, PainterError> {
    Self::load_with(source, DecodeOptions::default())
  }

  /// Opens the image, allocates exactly one buffer for it, decodes, then
  /// converts the pixels to [`Bgrx8`].
  ///
  /// Nothing is allocated when the header can't be read.
  ///
  /// ## Failure
  /// * Anything from [`DecodeContext::open_with`] or
  ///   [`DecodeContext::decode_into`].
  /// * [`PainterError::LimitExceeded`] if the pixel buffer is larger than
  ///   `max_memory_bytes`.
  /// * [`PainterError::Alloc`] if the allocator refuses the pixel buffer.
  pub fn load_with<S: ImageSource>(source: S, options: DecodeOptions) -> Result<Self, PainterError> {
    let ctx = DecodeContext::open_with(source, options)?;
    let geometry = ctx.geometry();
    let len = geometry.buffer_len();
    options.limits().check_memory(len)?;
    let mut bytes = Vec::new();
    bytes.try_reserve_exact(len)?;
    bytes.resize(len, 0);
    ctx.decode_into(&mut bytes)?;
    convert(&mut bytes);
    log::debug!("loaded {}x{} sprite", geometry.width(), geometry.height());
    Ok(Self { geometry, bytes })
  }

  /// Loads a PNG file from disk.
  ///
  /// A file that can't be opened is [`PainterError::Io`]. The `io::Error` is
  /// logged at `warn` level.
  #[cfg(feature = "std")]
  #[cfg_attr(docs_rs, doc(cfg(feature = "std")))]
  pub fn load_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self, PainterError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| {
      log::warn!("couldn't open {}: {e}", path.display());
      PainterError::Io
    })?;
    Self::load(crate::source::ReadSource::new(std::io::BufReader::new(file)))
  }

  #[inline]
  #[must_use]
  pub const fn geometry(&self) -> Geometry {
    self.geometry
  }

  #[inline]
  #[must_use]
  pub fn pixels(&self) -> &[Bgrx8] {
    bytemuck::cast_slice(&self.bytes)
  }

  /// The raw bytes: `width * height * 4`, blue first, control byte zeroed.
  #[inline]
  #[must_use]
  pub fn as_bytes(&self) -> &[u8] {
    &self.bytes
  }

  #[inline]
  #[must_use]
  pub fn into_bytes(self) -> Vec<u8> {
    self.bytes
  }

  /// The pixel at `(x, y)`, or `None` when out of bounds.
  #[inline]
  #[must_use]
  pub fn get(&self, x: u32, y: u32) -> Option<Bgrx8> {
    if x >= self.geometry.width() || y >= self.geometry.height() {
      return None;
    }
    let i = y as usize * self.geometry.width() as usize + x as usize;
    self.pixels().get(i).copied()
  }
}

/// A surface that sprites can be copied onto.
///
/// Implemented outside this crate by whatever owns the framebuffer. The
/// sprite's bytes are already in the framebuffer's channel order, so an
/// implementation only needs to copy rows and clip to its own bounds.
pub trait BlitTarget {
  /// Copies `sprite` with its top left corner at `(x, y)`. Parts of the
  /// sprite outside the target are clipped.
  fn blit(&mut self, sprite: &Sprite, x: i32, y: i32);
}

impl<T: BlitTarget + ?Sized> BlitTarget for &mut T {
  #[inline]
  fn blit(&mut self, sprite: &Sprite, x: i32, y: i32) {
    (**self).blit(sprite, x, y)
  }
}

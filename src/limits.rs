use crate::error::{LimitKind, PainterError};

/// Resource limits for decoding.
///
/// The default caps each side at 16,384 pixels to prevent accidental
/// out-of-memory problems. Other limits default to `None` (no limit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Limits {
  pub max_width: Option<u32>,
  pub max_height: Option<u32>,
  /// Maximum pixel count (width * height).
  pub max_pixels: Option<u64>,
  /// Maximum bytes for any single buffer the pipeline allocates.
  pub max_memory_bytes: Option<u64>,
}
impl Default for Limits {
  #[inline]
  fn default() -> Self {
    Self { max_width: Some(16_384), max_height: Some(16_384), max_pixels: None, max_memory_bytes: None }
  }
}
impl Limits {
  /// No limits at all.
  pub const NONE: Self =
    Self { max_width: None, max_height: None, max_pixels: None, max_memory_bytes: None };

  /// Check dimensions against limits.
  pub(crate) fn check(&self, width: u32, height: u32) -> Result<(), PainterError> {
    if let Some(max_w) = self.max_width {
      if width > max_w {
        return Err(exceeded(LimitKind::Width, width.into(), max_w.into()));
      }
    }
    if let Some(max_h) = self.max_height {
      if height > max_h {
        return Err(exceeded(LimitKind::Height, height.into(), max_h.into()));
      }
    }
    if let Some(max_px) = self.max_pixels {
      let pixels = u64::from(width) * u64::from(height);
      if pixels > max_px {
        return Err(exceeded(LimitKind::Pixels, pixels, max_px));
      }
    }
    Ok(())
  }

  /// Check that an allocation size is within memory limits.
  pub(crate) fn check_memory(&self, bytes: usize) -> Result<(), PainterError> {
    match self.max_memory_bytes {
      Some(max_mem) if bytes as u64 > max_mem => {
        Err(exceeded(LimitKind::Memory, bytes as u64, max_mem))
      }
      _ => Ok(()),
    }
  }
}

#[inline]
fn exceeded(kind: LimitKind, actual: u64, limit: u64) -> PainterError {
  PainterError::LimitExceeded { kind, actual, limit }
}

/// Settings for one decode.
///
/// ```
/// use painter::{DecodeOptions, Limits};
/// let opts = DecodeOptions::default()
///   .with_limits(Limits { max_pixels: Some(1 << 20), ..Limits::default() })
///   .verify_crc(false);
/// assert!(!opts.verifies_crc());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecodeOptions {
  limits: Limits,
  verify_crc: bool,
  verify_adler32: bool,
}
impl Default for DecodeOptions {
  #[inline]
  fn default() -> Self {
    Self { limits: Limits::default(), verify_crc: true, verify_adler32: true }
  }
}
impl DecodeOptions {
  /// Replace the resource limits.
  #[inline]
  #[must_use]
  pub const fn with_limits(mut self, limits: Limits) -> Self {
    self.limits = limits;
    self
  }

  /// Whether chunk CRC-32 values are checked.
  ///
  /// A bad CRC on a critical chunk is an error; a bad CRC on an ancillary
  /// chunk drops that chunk.
  #[inline]
  #[must_use]
  pub const fn verify_crc(mut self, verify: bool) -> Self {
    self.verify_crc = verify;
    self
  }

  /// Whether the zlib Adler-32 trailer is checked.
  #[inline]
  #[must_use]
  pub const fn verify_adler32(mut self, verify: bool) -> Self {
    self.verify_adler32 = verify;
    self
  }

  #[inline]
  #[must_use]
  pub const fn limits(&self) -> &Limits {
    &self.limits
  }

  #[inline]
  #[must_use]
  pub const fn verifies_crc(&self) -> bool {
    self.verify_crc
  }

  #[inline]
  #[must_use]
  pub const fn verifies_adler32(&self) -> bool {
    self.verify_adler32
  }
}

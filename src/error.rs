use core::fmt;

use crate::png::ChunkType;

/// An error from the `painter` crate.
///
/// Every error is terminal for the [`DecodeContext`](crate::DecodeContext)
/// that produced it (the context was consumed). Any pixel buffer that was
/// being written must be discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum PainterError {
  /// The image source reported a hard read error.
  #[error("image source read failed")]
  Io,

  /// The stream does not start with a usable PNG header.
  #[error("invalid PNG header: {0}")]
  HeaderParse(#[from] HeaderError),

  /// The image body is malformed, truncated, or inconsistent with the header.
  #[error("PNG decode failed: {0}")]
  Decode(#[from] DecodeError),

  /// The output buffer can't hold the full image.
  #[error("buffer too small: need {needed} bytes, got {actual}")]
  BufferTooSmall { needed: usize, actual: usize },

  /// The image is bigger than the configured [`Limits`](crate::Limits).
  #[error("{kind} {actual} exceeds limit {limit}")]
  LimitExceeded { kind: LimitKind, actual: u64, limit: u64 },

  /// The allocator couldn't give us enough space.
  #[error("allocation failed")]
  Alloc,
}

impl PainterError {
  /// Which broad class of failure this is.
  #[inline]
  #[must_use]
  pub const fn kind(&self) -> ErrorKind {
    match self {
      Self::Io => ErrorKind::Io,
      Self::HeaderParse(_) => ErrorKind::HeaderParse,
      Self::Decode(_) => ErrorKind::Decode,
      Self::BufferTooSmall { .. } | Self::LimitExceeded { .. } | Self::Alloc => ErrorKind::Usage,
    }
  }
}

impl From<alloc::collections::TryReserveError> for PainterError {
  #[inline]
  fn from(_: alloc::collections::TryReserveError) -> Self {
    Self::Alloc
  }
}

/// Broad classes of [`PainterError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
  /// The source failed.
  Io,
  /// Surfaced by `open`: the header is missing or unusable.
  HeaderParse,
  /// Surfaced by `decode_into`: the body is malformed or truncated.
  Decode,
  /// The caller's buffer, limits, or memory were insufficient.
  Usage,
}

/// Why the header could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum HeaderError {
  /// The first 8 bytes are not the PNG signature.
  #[error("not PNG data")]
  NotPng,
  /// The stream ended before the header was complete.
  #[error("stream ended inside the header")]
  Truncated,
  /// The first chunk must be a 13 byte `IHDR`.
  #[error("first chunk is not IHDR")]
  FirstChunkNotIhdr,
  /// The `IHDR` checksum doesn't match its contents.
  #[error("IHDR checksum mismatch")]
  CrcMismatch,
  /// Some `IHDR` field holds a value PNG doesn't allow.
  #[error("illegal IHDR field values")]
  IllegalHeader,
  /// The declared width and/or height of this image is 0.
  #[error("width or height is zero")]
  ZeroDimension,
  /// The image byte size doesn't fit in memory on this target.
  #[error("dimensions too large: {width}x{height}")]
  DimensionsTooLarge { width: u32, height: u32 },
}

/// Why the image body could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum DecodeError {
  /// The stream ended before `IEND`.
  #[error("stream ended before the image was complete")]
  Truncated,
  /// A critical chunk's checksum doesn't match its contents.
  #[error("{0:?} checksum mismatch")]
  CrcMismatch(ChunkType),
  /// Chunk lengths are limited to `2^31 - 1` bytes.
  #[error("chunk length exceeds 2^31-1")]
  ChunkTooLong,
  /// A critical chunk this decoder doesn't know about.
  #[error("unknown critical chunk {0:?}")]
  UnknownCriticalChunk(ChunkType),
  /// A chunk appeared where PNG doesn't allow it.
  #[error("misplaced chunk {0:?}")]
  MisplacedChunk(ChunkType),
  /// `IEND` was reached without any `IDAT`.
  #[error("no image data")]
  MissingImageData,
  /// An indexed color image had no palette.
  #[error("indexed image without PLTE")]
  MissingPalette,
  /// The palette length isn't a multiple of 3, or has more than 256 entries.
  #[error("malformed PLTE")]
  BadPalette,
  /// The zlib data stream is corrupt.
  #[error("zlib data is corrupt")]
  Inflate,
  /// The zlib data checksum doesn't match the inflated bytes.
  #[error("zlib checksum mismatch")]
  Adler32Mismatch,
  /// The image data ended short of what the header requires.
  #[error("image data is incomplete")]
  ImageDataIncomplete,
  /// A scanline declared a filter type other than 0 through 4.
  #[error("illegal filter type {0}")]
  IllegalFilter(u8),
}

/// Which limit was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitKind {
  /// Image width.
  Width,
  /// Image height.
  Height,
  /// Width times height.
  Pixels,
  /// Bytes for one allocation.
  Memory,
}
impl fmt::Display for LimitKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Width => "width",
      Self::Height => "height",
      Self::Pixels => "pixel count",
      Self::Memory => "allocation size",
    })
  }
}

//! The byte source side of the decoder.
//!
//! The decoder pulls bytes with [`ImageSource::read`], one request at a time.
//! A source answers each request with exactly one [`ReadOutcome`], and the
//! decoder keeps asking until it has what it needs. Sources never retry,
//! buffer, or coalesce reads on their own.

use core::num::NonZeroUsize;

/// Result of one read request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadOutcome {
  /// This many bytes were written to the front of the destination.
  ///
  /// May be less than requested. The count is never larger than the
  /// destination's length.
  Data(NonZeroUsize),
  /// There's no more data. This is not a failure by itself, the decoder
  /// decides if more data was required.
  EndOfStream,
  /// The source is broken.
  Error,
}

/// Something the decoder can pull compressed image bytes from.
///
/// ```
/// use painter::{ImageSource, ReadOutcome};
///
/// /// Hands out one byte per call.
/// struct Drip<'a>(&'a [u8]);
/// impl ImageSource for Drip<'_> {
///   fn read(&mut self, dest: &mut [u8]) -> ReadOutcome {
///     match (self.0.split_first(), dest.first_mut()) {
///       (Some((b, rest)), Some(d)) => {
///         *d = *b;
///         self.0 = rest;
///         ReadOutcome::Data(core::num::NonZeroUsize::MIN)
///       }
///       (None, _) => ReadOutcome::EndOfStream,
///       (_, None) => ReadOutcome::Error,
///     }
///   }
/// }
/// ```
pub trait ImageSource {
  /// Issue one read for up to `dest.len()` bytes.
  fn read(&mut self, dest: &mut [u8]) -> ReadOutcome;
}

impl<S: ImageSource + ?Sized> ImageSource for &mut S {
  #[inline]
  fn read(&mut self, dest: &mut [u8]) -> ReadOutcome {
    (**self).read(dest)
  }
}

/// Reads from the front of the slice, advancing it.
impl ImageSource for &[u8] {
  #[inline]
  fn read(&mut self, dest: &mut [u8]) -> ReadOutcome {
    let count = dest.len().min(self.len());
    match NonZeroUsize::new(count) {
      Some(n) => {
        let (head, tail) = self.split_at(count);
        dest[..count].copy_from_slice(head);
        *self = tail;
        ReadOutcome::Data(n)
      }
      None if self.is_empty() => ReadOutcome::EndOfStream,
      // asked for zero bytes while data remains
      None => ReadOutcome::Error,
    }
  }
}

/// Adapts any [`std::io::Read`] (a `File`, a pipe, a socket) to
/// [`ImageSource`].
///
/// * `Ok(0)` is the end of the stream.
/// * `Ok(n)` is `n` bytes of data.
/// * Every `Err`, including `Interrupted`, is an error. The `io::Error` itself
///   is logged at `warn` level and then dropped.
#[cfg(feature = "std")]
#[cfg_attr(docs_rs, doc(cfg(feature = "std")))]
#[derive(Debug)]
pub struct ReadSource<R> {
  inner: R,
}
#[cfg(feature = "std")]
impl<R: std::io::Read> ReadSource<R> {
  #[inline]
  pub const fn new(inner: R) -> Self {
    Self { inner }
  }

  /// Gives back the wrapped reader.
  #[inline]
  pub fn into_inner(self) -> R {
    self.inner
  }
}
#[cfg(feature = "std")]
impl<R: std::io::Read> ImageSource for ReadSource<R> {
  fn read(&mut self, dest: &mut [u8]) -> ReadOutcome {
    match self.inner.read(dest) {
      Ok(0) => ReadOutcome::EndOfStream,
      Ok(n) if n <= dest.len() => NonZeroUsize::new(n).map_or(ReadOutcome::Error, ReadOutcome::Data),
      Ok(n) => {
        log::warn!("reader claimed {n} bytes for a {} byte request", dest.len());
        ReadOutcome::Error
      }
      Err(e) => {
        log::warn!("image source read failed: {e}");
        ReadOutcome::Error
      }
    }
  }
}

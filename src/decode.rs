//! Pulls a PNG out of an [`ImageSource`] in two steps.
//!
//! 1) [`open`] reads the signature and the `IHDR` chunk, and reports the
//!    [`Geometry`] so that the caller can size a buffer.
//! 2) [`DecodeContext::decode_into`] reads the rest of the chunks up to `IEND`
//!    and writes RGBA8 pixels into that buffer.
//!
//! Both steps consume their input, so a context can't be decoded twice, and a
//! context that failed is already gone.

use alloc::{boxed::Box, vec::Vec};

use log::{debug, trace, warn};
use miniz_oxide::inflate::{
  core::{
    decompress,
    inflate_flags::{
      TINFL_FLAG_HAS_MORE_INPUT, TINFL_FLAG_IGNORE_ADLER32, TINFL_FLAG_PARSE_ZLIB_HEADER,
      TINFL_FLAG_USING_NON_WRAPPING_OUTPUT_BUF,
    },
    DecompressorOxide,
  },
  TINFLStatus,
};

use crate::{
  error::{DecodeError, HeaderError, PainterError},
  limits::DecodeOptions,
  pixels::Rgba8,
  png::*,
  source::{ImageSource, ReadOutcome},
};

/// Chunk data streams through a buffer of this size.
const SCRATCH_LEN: usize = 4 * 1024;

/// PNG four byte integers are limited to 2^31-1
const MAX_CHUNK_LEN: u32 = i32::MAX as u32;

/// The size of an image.
///
/// Both sides are non-zero, and the byte length of an RGBA8 buffer for the
/// image fits in `usize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Geometry {
  width: u32,
  height: u32,
}
impl Geometry {
  /// `None` if either side is 0, or if `width * height * 4` overflows.
  #[inline]
  #[must_use]
  pub const fn new(width: u32, height: u32) -> Option<Self> {
    if width == 0 || height == 0 {
      return None;
    }
    match (width as usize).checked_mul(height as usize) {
      Some(pixels) if pixels.checked_mul(4).is_some() => Some(Self { width, height }),
      _ => None,
    }
  }
  #[inline]
  #[must_use]
  pub const fn width(&self) -> u32 {
    self.width
  }
  #[inline]
  #[must_use]
  pub const fn height(&self) -> u32 {
    self.height
  }
  /// `width * height`
  #[inline]
  #[must_use]
  pub const fn pixel_count(&self) -> usize {
    self.width as usize * self.height as usize
  }
  /// Bytes needed for an RGBA8 (or BGRX8) copy of the image.
  #[inline]
  #[must_use]
  pub const fn buffer_len(&self) -> usize {
    self.pixel_count() * 4
  }
}

/// Why a read came up short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
  EndOfStream,
  Io,
}
impl Fault {
  #[inline]
  fn in_header(self) -> PainterError {
    match self {
      Self::EndOfStream => HeaderError::Truncated.into(),
      Self::Io => PainterError::Io,
    }
  }
  #[inline]
  fn in_body(self) -> PainterError {
    match self {
      Self::EndOfStream => DecodeError::Truncated.into(),
      Self::Io => PainterError::Io,
    }
  }
}

/// Reads until `dest` is full, however many requests that takes.
fn fill<S: ImageSource>(source: &mut S, dest: &mut [u8]) -> Result<(), Fault> {
  let mut filled = 0;
  while filled < dest.len() {
    let want = dest.len() - filled;
    match source.read(&mut dest[filled..]) {
      ReadOutcome::Data(n) if n.get() <= want => filled += n.get(),
      ReadOutcome::Data(n) => {
        warn!("image source claimed {n} bytes for a {want} byte read");
        return Err(Fault::Io);
      }
      ReadOutcome::EndOfStream => return Err(Fault::EndOfStream),
      ReadOutcome::Error => return Err(Fault::Io),
    }
  }
  Ok(())
}

/// Splits the 8 bytes in front of chunk data into the length and type.
#[inline]
const fn chunk_start(bytes: [u8; 8]) -> (u32, ChunkType) {
  let [l0, l1, l2, l3, t0, t1, t2, t3] = bytes;
  (u32::from_be_bytes([l0, l1, l2, l3]), ChunkType([t0, t1, t2, t3]))
}

/// A PNG that has had its header parsed, and is ready to decode.
///
/// Made by [`open`] (or [`DecodeContext::open`]), used up by
/// [`DecodeContext::decode_into`].
#[derive(Debug)]
pub struct DecodeContext<S> {
  source: S,
  header: PngHeader,
  geometry: Geometry,
  filtered_len: usize,
  options: DecodeOptions,
}

/// Opens a PNG with the default [`DecodeOptions`].
///
/// This is [`DecodeContext::open`], plus the geometry handed back directly so
/// the caller can size a buffer.
///
/// ```
/// # fn main() -> Result<(), painter::PainterError> {
/// # let png: &[u8] = &[];
/// # if png.is_empty() { return Ok(()) }
/// let (ctx, geometry) = painter::open(png)?;
/// let mut buffer = vec![0_u8; geometry.buffer_len()];
/// ctx.decode_into(&mut buffer)?;
/// # Ok(())
/// # }
/// ```
#[inline]
pub fn open<S: ImageSource>(source: S) -> Result<(DecodeContext<S>, Geometry), PainterError> {
  let ctx = DecodeContext::open(source)?;
  let geometry = ctx.geometry();
  Ok((ctx, geometry))
}

impl<S: ImageSource> DecodeContext<S> {
  /// Reads the signature and `IHDR`, using the default options.
  #[inline]
  pub fn open(source: S) -> Result<Self, PainterError> {
    Self::open_with(source, DecodeOptions::default())
  }

  /// Reads the signature and `IHDR`.
  ///
  /// ## Failure
  /// * [`PainterError::HeaderParse`] when the header is missing, cut short, or
  ///   illegal.
  /// * [`PainterError::Io`] when the source fails.
  /// * [`PainterError::LimitExceeded`] when the image is larger than the
  ///   options allow.
  pub fn open_with(mut source: S, options: DecodeOptions) -> Result<Self, PainterError> {
    let mut signature = [0_u8; 8];
    fill(&mut source, &mut signature).map_err(Fault::in_header)?;
    if !is_png_signature(&signature) {
      return Err(HeaderError::NotPng.into());
    }

    let mut start = [0_u8; 8];
    fill(&mut source, &mut start).map_err(Fault::in_header)?;
    let (len, ty) = chunk_start(start);
    if ty != ChunkType::IHDR || len != 13 {
      return Err(HeaderError::FirstChunkNotIhdr.into());
    }
    let mut body = [0_u8; 13 + 4];
    fill(&mut source, &mut body).map_err(Fault::in_header)?;
    let (data, crc) = body.split_at(13);
    let declared_crc = u32::from_be_bytes([crc[0], crc[1], crc[2], crc[3]]);
    if options.verifies_crc() && png_crc(ty.0, data) != declared_crc {
      return Err(HeaderError::CrcMismatch.into());
    }

    let header = PngHeader::try_from(data)?;
    let PngHeader { width, height, .. } = header;
    options.limits().check(width, height)?;
    let too_large = HeaderError::DimensionsTooLarge { width, height };
    let geometry = Geometry::new(width, height).ok_or(too_large)?;
    let filtered_len = header.filtered_len().ok_or(too_large)?;
    debug!("opened PNG: {header:?}, {filtered_len} filtered bytes");

    Ok(Self { source, header, geometry, filtered_len, options })
  }

  #[inline]
  #[must_use]
  pub const fn geometry(&self) -> Geometry {
    self.geometry
  }

  /// The full parsed `IHDR`.
  #[inline]
  #[must_use]
  pub const fn header(&self) -> &PngHeader {
    &self.header
  }

  /// Decodes the image into `buffer` as RGBA8 bytes.
  ///
  /// Only the first [`Geometry::buffer_len`] bytes are written. If this
  /// returns an error, the buffer's content is unspecified.
  ///
  /// ## Failure
  /// * [`PainterError::BufferTooSmall`] before anything is read.
  /// * [`PainterError::Decode`] for a malformed or truncated body.
  /// * [`PainterError::Io`] when the source fails.
  /// * [`PainterError::LimitExceeded`] or [`PainterError::Alloc`] for the
  ///   inflate buffer.
  pub fn decode_into(self, buffer: &mut [u8]) -> Result<(), PainterError> {
    let needed = self.geometry.buffer_len();
    match buffer.get_mut(..needed) {
      Some(prefix) => self.decode_into_pixels(bytemuck::cast_slice_mut(prefix)),
      None => Err(PainterError::BufferTooSmall { needed, actual: buffer.len() }),
    }
  }

  /// As [`decode_into`](Self::decode_into), with a typed pixel buffer.
  ///
  /// Buffer sizes in errors are still given in bytes.
  pub fn decode_into_pixels(mut self, pixels: &mut [Rgba8]) -> Result<(), PainterError> {
    let needed = self.geometry.pixel_count();
    if pixels.len() < needed {
      return Err(PainterError::BufferTooSmall {
        needed: self.geometry.buffer_len(),
        actual: pixels.len().saturating_mul(4),
      });
    }
    let pixels = &mut pixels[..needed];

    self.options.limits().check_memory(self.filtered_len)?;
    let mut filtered: Vec<u8> = Vec::new();
    filtered.try_reserve_exact(self.filtered_len)?;
    filtered.resize(self.filtered_len, 0);

    let Body { palette, transparency: trns } = self.read_body(&mut filtered)?;

    if self.header.color_type == PngColorType::Index && palette.is_empty() {
      return Err(DecodeError::MissingPalette.into());
    }
    let transparency = match &trns {
      Some(data) => Transparency::parse(self.header.color_type, data).unwrap_or_else(|| {
        warn!("ignoring tRNS of {} bytes for {:?}", data.len(), self.header.color_type);
        Transparency::Opaque
      }),
      None => Transparency::Opaque,
    };
    let expander = Expander::new(&self.header, &palette, transparency);
    let width = self.geometry.width as usize;
    unfilter_decompressed_data(&self.header, &mut filtered, |x, y, data| {
      if let Some(p) = pixels.get_mut(y as usize * width + x as usize) {
        *p = expander.rgba(data);
      }
    })?;
    Ok(())
  }

  /// Reads every chunk after `IHDR` up to and including `IEND`, inflating the
  /// image data into `filtered`.
  fn read_body(&mut self, filtered: &mut [u8]) -> Result<Body, PainterError> {
    let mut inflater = Inflater::new(self.options.verifies_adler32());
    let mut scratch = [0_u8; SCRATCH_LEN];
    let mut body = Body { palette: Vec::new(), transparency: None };
    let mut seen_plte = false;
    let mut seen_idat = false;
    let mut chunk_count = 1_usize;

    loop {
      let mut start = [0_u8; 8];
      self.read(&mut start)?;
      let (len, ty) = chunk_start(start);
      chunk_count += 1;
      trace!("chunk {ty:?}, {len} bytes");
      if len > MAX_CHUNK_LEN {
        return Err(DecodeError::ChunkTooLong.into());
      }
      let mut crc = Crc32::new();
      crc.update(&ty.0);

      match ty {
        ChunkType::IDAT => {
          seen_idat = true;
          let mut remaining = len as usize;
          while remaining > 0 {
            let piece = &mut scratch[..remaining.min(SCRATCH_LEN)];
            self.read(piece)?;
            crc.update(piece);
            inflater.feed(piece, filtered)?;
            remaining -= piece.len();
          }
          self.check_crc(ty, crc)?;
        }
        ChunkType::PLTE => {
          // grayscale images can't carry a palette, not even a suggested one
          let gray = matches!(self.header.color_type, PngColorType::Y | PngColorType::YA);
          if seen_idat || seen_plte || gray {
            return Err(DecodeError::MisplacedChunk(ty).into());
          }
          seen_plte = true;
          if len > 256 * 3 {
            return Err(DecodeError::BadPalette.into());
          }
          let data = self.read_small_chunk(len, &mut crc)?;
          self.check_crc(ty, crc)?;
          let entries: &[[u8; 3]] =
            bytemuck::try_cast_slice(&data[..]).map_err(|_| DecodeError::BadPalette)?;
          let max_entries = match self.header.color_type {
            PngColorType::Index => 1_usize << self.header.bit_depth,
            _ => 256,
          };
          if entries.is_empty() || entries.len() > max_entries {
            return Err(DecodeError::BadPalette.into());
          }
          body.palette.try_reserve_exact(entries.len())?;
          body.palette.extend_from_slice(entries);
        }
        ChunkType::tRNS => {
          if seen_idat {
            return Err(DecodeError::MisplacedChunk(ty).into());
          }
          if self.header.color_type == PngColorType::Index && !seen_plte {
            warn!("skipping tRNS that comes before PLTE");
            self.skip(len, &mut crc, &mut scratch)?;
            self.ancillary_crc_ok(ty, crc)?;
            continue;
          }
          if len > 256 {
            warn!("skipping oversized tRNS chunk ({len} bytes)");
            self.skip(len, &mut crc, &mut scratch)?;
            self.ancillary_crc_ok(ty, crc)?;
            continue;
          }
          let data = self.read_small_chunk(len, &mut crc)?;
          if self.ancillary_crc_ok(ty, crc)? {
            body.transparency = Some(data);
          }
        }
        ChunkType::IEND => {
          self.skip(len, &mut crc, &mut scratch)?;
          self.check_crc(ty, crc)?;
          break;
        }
        ChunkType::IHDR => return Err(DecodeError::MisplacedChunk(ty).into()),
        other if other.is_critical() => {
          return Err(DecodeError::UnknownCriticalChunk(other).into());
        }
        _ => {
          self.skip(len, &mut crc, &mut scratch)?;
          self.ancillary_crc_ok(ty, crc)?;
        }
      }
    }

    if !seen_idat {
      return Err(DecodeError::MissingImageData.into());
    }
    if !inflater.done || inflater.out_pos < filtered.len() {
      return Err(DecodeError::ImageDataIncomplete.into());
    }
    debug!("decoded {chunk_count} chunks, {} bytes inflated", inflater.out_pos);
    Ok(body)
  }

  #[inline]
  fn read(&mut self, dest: &mut [u8]) -> Result<(), PainterError> {
    fill(&mut self.source, dest).map_err(Fault::in_body)
  }

  /// Reads the chunk's data into a new `Vec`. Callers cap `len` first.
  fn read_small_chunk(&mut self, len: u32, crc: &mut Crc32) -> Result<Vec<u8>, PainterError> {
    let len = len as usize;
    self.options.limits().check_memory(len)?;
    let mut data = Vec::new();
    data.try_reserve_exact(len)?;
    data.resize(len, 0);
    self.read(&mut data)?;
    crc.update(&data);
    Ok(data)
  }

  fn skip(
    &mut self, len: u32, crc: &mut Crc32, scratch: &mut [u8; SCRATCH_LEN],
  ) -> Result<(), PainterError> {
    let mut remaining = len as usize;
    while remaining > 0 {
      let piece = &mut scratch[..remaining.min(SCRATCH_LEN)];
      self.read(piece)?;
      crc.update(piece);
      remaining -= piece.len();
    }
    Ok(())
  }

  fn read_declared_crc(&mut self) -> Result<u32, PainterError> {
    let mut bytes = [0_u8; 4];
    self.read(&mut bytes)?;
    Ok(u32::from_be_bytes(bytes))
  }

  /// A critical chunk with a bad CRC fails the whole decode.
  fn check_crc(&mut self, ty: ChunkType, crc: Crc32) -> Result<(), PainterError> {
    let declared = self.read_declared_crc()?;
    if self.options.verifies_crc() && declared != crc.finish() {
      return Err(DecodeError::CrcMismatch(ty).into());
    }
    Ok(())
  }

  /// An ancillary chunk with a bad CRC is dropped, but decoding goes on.
  fn ancillary_crc_ok(&mut self, ty: ChunkType, crc: Crc32) -> Result<bool, PainterError> {
    let declared = self.read_declared_crc()?;
    if self.options.verifies_crc() && declared != crc.finish() {
      warn!("dropping {ty:?} chunk with a bad CRC");
      return Ok(false);
    }
    Ok(true)
  }
}

/// What the non-`IDAT` chunks contributed.
struct Body {
  palette: Vec<[u8; 3]>,
  transparency: Option<Vec<u8>>,
}

/// The zlib stream that is split across all the `IDAT` chunks.
struct Inflater {
  core: Box<DecompressorOxide>,
  flags: u32,
  out_pos: usize,
  done: bool,
}
impl Inflater {
  fn new(verify_adler32: bool) -> Self {
    // the zlib header flag goes on every call, or the adler32 isn't tracked
    let flags = TINFL_FLAG_PARSE_ZLIB_HEADER
      | TINFL_FLAG_USING_NON_WRAPPING_OUTPUT_BUF
      | TINFL_FLAG_HAS_MORE_INPUT
      | if verify_adler32 { 0 } else { TINFL_FLAG_IGNORE_ADLER32 };
    Self { core: Box::default(), flags, out_pos: 0, done: false }
  }

  /// Inflates `input` into `out`, after whatever earlier calls wrote.
  ///
  /// Once the stream is done, any further input is ignored.
  fn feed(&mut self, mut input: &[u8], out: &mut [u8]) -> Result<(), DecodeError> {
    while !self.done && !input.is_empty() {
      let (status, consumed, written) =
        decompress(&mut self.core, input, out, self.out_pos, self.flags);
      input = &input[consumed..];
      self.out_pos += written;
      match status {
        TINFLStatus::Done => self.done = true,
        TINFLStatus::NeedsMoreInput => return Ok(()),
        TINFLStatus::HasMoreOutput if self.out_pos >= out.len() => {
          warn!("image data continues past the size given in IHDR, ignoring the rest");
          self.done = true;
        }
        TINFLStatus::HasMoreOutput if consumed == 0 && written == 0 => {
          return Err(DecodeError::Inflate);
        }
        TINFLStatus::HasMoreOutput => (),
        TINFLStatus::Adler32Mismatch => return Err(DecodeError::Adler32Mismatch),
        TINFLStatus::FailedCannotMakeProgress | TINFLStatus::BadParam | TINFLStatus::Failed => {
          return Err(DecodeError::Inflate)
        }
      }
    }
    Ok(())
  }
}

use super::*;

use crate::error::DecodeError;

const fn paeth_predict(a: u8, b: u8, c: u8) -> u8 {
  let a_ = a as i32;
  let b_ = b as i32;
  let c_ = c as i32;
  let p: i32 = a_ + b_ - c_;
  let pa = (p - a_).abs();
  let pb = (p - b_).abs();
  let pc = (p - c_).abs();
  // ties must resolve in exactly this order: a, then b, then c
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

/// Undoes the filter on one line, in place.
///
/// `prev` is the already unfiltered line above. It's `None` on the first line
/// of each (reduced) image, where the line above is implicitly all zero.
fn unfilter_line(
  filter: u8, line: &mut [u8], prev: Option<&[u8]>, bpp: usize,
) -> Result<(), DecodeError> {
  let up = |i: usize| prev.map_or(0, |p| p[i]);
  match filter {
    0 => (),
    1 => {
      // Sub
      for i in bpp..line.len() {
        line[i] = line[i].wrapping_add(line[i - bpp]);
      }
    }
    2 => {
      // Up
      if let Some(prev) = prev {
        line.iter_mut().zip(prev).for_each(|(p, b)| *p = p.wrapping_add(*b));
      }
    }
    3 => {
      // Average
      for i in 0..line.len() {
        let a = if i >= bpp { line[i - bpp] } else { 0 };
        line[i] = line[i].wrapping_add(((u16::from(a) + u16::from(up(i))) / 2) as u8);
      }
    }
    4 => {
      // Paeth
      for i in 0..line.len() {
        let (a, c) = if i >= bpp { (line[i - bpp], up(i - bpp)) } else { (0, 0) };
        line[i] = line[i].wrapping_add(paeth_predict(a, up(i), c));
      }
    }
    other => return Err(DecodeError::IllegalFilter(other)),
  }
  Ok(())
}

/// Calls `op` once per pixel of an unfiltered line.
///
/// Bit-packed pixels are unpacked first, with the value in the low bits of a
/// single byte. Padding bits at the end of the line are never sent.
fn send_out_line<F: FnMut(u32, u32, &[u8])>(
  header: &PngHeader, pass: Pass, reduced_width: u32, reduced_y: u32, pixels: &[u8], op: &mut F,
) {
  let bit_depth = u32::from(header.bit_depth);
  if bit_depth < 8 {
    let mask = (1_u8 << bit_depth) - 1;
    let mut reduced_x = 0;
    'bytes: for &byte in pixels {
      let mut shift = 8;
      while shift > 0 {
        if reduced_x >= reduced_width {
          break 'bytes;
        }
        shift -= bit_depth;
        let (x, y) = pass.full_pos(reduced_x, reduced_y);
        op(x, y, &[(byte >> shift) & mask]);
        reduced_x += 1;
      }
    }
  } else {
    for (reduced_x, pixel) in (0..reduced_width).zip(pixels.chunks_exact(header.filter_chunk_size()))
    {
      let (x, y) = pass.full_pos(reduced_x, reduced_y);
      op(x, y, pixel);
    }
  }
}

/// Unfilters all of the inflated image data and passes each pixel to `op`.
///
/// Each call to the `op` gets `|x, y, data|`, where `x` and `y` are the pixel's
/// position in the full image (already de-interlaced), and `data` is the
/// pixel's unfiltered bytes.
///
/// The data is unfiltered in place, and each filter byte is reset to 0.
///
/// ## Failure
/// * A filter type byte greater than 4.
/// * `filtered` is shorter than [`PngHeader::filtered_len`]. Some pixels may
///   have been sent to `op` before this is noticed. Extra bytes past that
///   length are ignored.
pub(crate) fn unfilter_decompressed_data<F>(
  header: &PngHeader, mut filtered: &mut [u8], mut op: F,
) -> Result<(), DecodeError>
where
  F: FnMut(u32, u32, &[u8]),
{
  let bpp = header.filter_chunk_size();
  for (pass, reduced_width, reduced_height) in header.passes() {
    // a reduced image can be empty even though the full image is not
    if reduced_width == 0 || reduced_height == 0 {
      continue;
    }
    let line_len =
      header.bytes_per_filterline(reduced_width).ok_or(DecodeError::ImageDataIncomplete)?;
    let image_len =
      line_len.checked_mul(reduced_height as usize).ok_or(DecodeError::ImageDataIncomplete)?;
    if filtered.len() < image_len {
      return Err(DecodeError::ImageDataIncomplete);
    }
    let (this_image, more_bytes) = core::mem::take(&mut filtered).split_at_mut(image_len);
    filtered = more_bytes;

    let mut prev: Option<&[u8]> = None;
    for (reduced_y, line) in this_image.chunks_exact_mut(line_len).enumerate() {
      let (f, pixels) = line.split_at_mut(1);
      unfilter_line(f[0], pixels, prev, bpp)?;
      f[0] = 0;
      let pixels: &[u8] = pixels;
      send_out_line(header, pass, reduced_width, reduced_y as u32, pixels, &mut op);
      prev = Some(pixels);
    }
  }
  Ok(())
}

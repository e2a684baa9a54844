//! CRC-32 as PNG uses it: over the chunk type and chunk data, not the length.

const CRC_TABLE: [u32; 256] = make_crc_table();

const fn make_crc_table() -> [u32; 256] {
  let mut out = [0; 256];
  let mut n = 0;
  while n < 256 {
    let mut c = n as u32;
    let mut k = 0;
    while k < 8 {
      c = if (c & 1) != 0 { 0xEDB8_8320_u32 ^ (c >> 1) } else { c >> 1 };
      //
      k += 1;
    }
    out[n] = c;
    //
    n += 1;
  }
  out
}

/// A running chunk checksum, fed as the chunk's bytes arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Crc32(u32);
impl Crc32 {
  #[inline]
  #[must_use]
  pub const fn new() -> Self {
    Self(u32::MAX)
  }

  #[inline]
  pub fn update(&mut self, bytes: &[u8]) {
    let mut crc = self.0;
    for &byte in bytes {
      let i = (crc ^ u32::from(byte)) as u8 as usize;
      crc = CRC_TABLE[i] ^ (crc >> 8);
    }
    self.0 = crc;
  }

  #[inline]
  #[must_use]
  pub const fn finish(self) -> u32 {
    self.0 ^ u32::MAX
  }
}

/// Checksum of one chunk, given its type and all of its data.
#[inline]
#[must_use]
pub(crate) fn png_crc(chunk_ty: [u8; 4], data: &[u8]) -> u32 {
  let mut crc = Crc32::new();
  crc.update(&chunk_ty);
  crc.update(data);
  crc.finish()
}

#[test]
fn test_crc_matches_known_chunks() {
  // every PNG ends with this exact IEND chunk
  assert_eq!(png_crc(*b"IEND", &[]), 0xAE42_6082);
  // splitting the input doesn't change the result
  let data = b"the quick brown fox";
  let mut crc = Crc32::new();
  crc.update(b"tE");
  crc.update(b"Xt");
  crc.update(&data[..7]);
  crc.update(&data[7..]);
  assert_eq!(crc.finish(), png_crc(*b"tEXt", data));
}

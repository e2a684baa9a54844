#![no_std]
#![cfg_attr(docs_rs, feature(doc_cfg))]
#![forbid(unsafe_code)]

//! Loads PNG images into framebuffer-ready BGRX pixels.
//!
//! The pipeline has three steps, each usable on its own:
//!
//! 1) [`open`] pulls the header from an [`ImageSource`] and gives back a
//!    [`DecodeContext`] along with the image's [`Geometry`].
//! 2) [`DecodeContext::decode_into`] fills a caller-provided buffer of
//!    [`Geometry::buffer_len`] bytes with RGBA8 pixels.
//! 3) [`convert`] rewrites that buffer in place to BGRX8, the channel order
//!    the framebuffer wants (with the alpha byte cleared).
//!
//! [`Sprite::load`] runs all three steps and owns the result, which can then
//! be handed to a [`BlitTarget`].
//!
//! ```
//! use painter::{convert, open};
//! # fn main() -> Result<(), painter::PainterError> {
//! # let png_bytes: &[u8] = &[];
//! # if png_bytes.is_empty() { return Ok(()) }
//! let (ctx, geometry) = open(png_bytes)?;
//! let mut buffer = vec![0_u8; geometry.buffer_len()];
//! ctx.decode_into(&mut buffer)?;
//! convert(&mut buffer);
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//! * `std` (default): [`ReadSource`] for any `std::io::Read`, and
//!   [`Sprite::load_path`]. Without it the crate is `no_std` and only needs
//!   `alloc`.

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

#[cfg(target_pointer_width = "16")]
compile_error!("this crate assumes 32-bit or bigger pointers!");

mod error;
pub use error::*;

mod limits;
pub use limits::*;

mod source;
pub use source::*;

mod pixels;
pub use pixels::*;

mod convert;
pub use convert::*;

pub mod png;

mod decode;
pub use decode::*;

mod sprite;
pub use sprite::*;

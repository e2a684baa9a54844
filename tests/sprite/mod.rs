use painter::{
  BlitTarget, Bgrx8, DecodeOptions, HeaderError, LimitKind, Limits, PainterError, Sprite,
};

use super::{rgb_2x2, Trickle};

/// A tiny framebuffer that clips at its edges.
struct Framebuffer {
  width: usize,
  height: usize,
  pixels: Vec<Bgrx8>,
}
impl Framebuffer {
  fn new(width: usize, height: usize) -> Self {
    Self { width, height, pixels: vec![Bgrx8::default(); width * height] }
  }
}
impl BlitTarget for Framebuffer {
  fn blit(&mut self, sprite: &Sprite, x: i32, y: i32) {
    let g = sprite.geometry();
    for sy in 0..g.height() {
      for sx in 0..g.width() {
        let (tx, ty) = (x + sx as i32, y + sy as i32);
        if tx < 0 || ty < 0 || tx as usize >= self.width || ty as usize >= self.height {
          continue;
        }
        self.pixels[ty as usize * self.width + tx as usize] = sprite.get(sx, sy).unwrap();
      }
    }
  }
}

#[test]
fn test_sprite_load() {
  let png = rgb_2x2().build();
  let sprite = Sprite::load(&png[..]).unwrap();
  assert_eq!((sprite.geometry().width(), sprite.geometry().height()), (2, 2));
  assert_eq!(sprite.as_bytes().len(), 16);
  assert_eq!(&sprite.as_bytes()[..4], &[0, 0, 255, 0]);
  assert_eq!(sprite.pixels()[3], Bgrx8 { b: 30, g: 20, r: 10, x: 0 });
  assert_eq!(sprite.get(1, 0), Some(Bgrx8 { b: 0, g: 255, r: 0, x: 0 }));
  assert_eq!(sprite.get(2, 0), None);
  assert_eq!(sprite.get(0, 2), None);

  let mut trickle = Trickle::new(&png, 3);
  assert_eq!(Sprite::load(&mut trickle).unwrap(), sprite);
  assert_eq!(sprite.into_bytes().len(), 16);
}

#[test]
fn test_sprite_load_errors() {
  let e = Sprite::load(&b"definitely not a png file"[..]).unwrap_err();
  assert_eq!(e, PainterError::HeaderParse(HeaderError::NotPng));

  let png = rgb_2x2().build();
  let options =
    DecodeOptions::default().with_limits(Limits { max_memory_bytes: Some(15), ..Limits::NONE });
  assert_eq!(
    Sprite::load_with(&png[..], options),
    Err(PainterError::LimitExceeded { kind: LimitKind::Memory, actual: 16, limit: 15 })
  );
}

#[test]
fn test_blit_clips() {
  let sprite = Sprite::load(&rgb_2x2().build()[..]).unwrap();
  let mut fb = Framebuffer::new(3, 3);
  fb.blit(&sprite, -1, 1);
  let blank = Bgrx8::default();
  assert_eq!(
    fb.pixels,
    [
      blank,
      blank,
      blank,
      Bgrx8 { b: 0, g: 255, r: 0, x: 0 },
      blank,
      blank,
      Bgrx8 { b: 30, g: 20, r: 10, x: 0 },
      blank,
      blank,
    ]
  );
  // through a `&mut` as well
  fn draw_corner<T: BlitTarget>(mut target: T, sprite: &Sprite) {
    target.blit(sprite, 2, 2);
  }
  draw_corner(&mut fb, &sprite);
  assert_eq!(fb.pixels[8], Bgrx8 { b: 0, g: 0, r: 255, x: 0 });
}

#[test]
fn test_sprite_load_path() {
  let sprite = Sprite::load_path("tests/images/rgb8_2x2.png").unwrap();
  assert_eq!(sprite.get(0, 0), Some(Bgrx8 { b: 0, g: 0, r: 255, x: 0 }));
  assert_eq!(Sprite::load_path("tests/images/no_such_file.png"), Err(PainterError::Io));
}

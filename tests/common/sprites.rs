use image::{Rgba, RgbaImage};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_SCRATCH: AtomicUsize = AtomicUsize::new(0);

/// Fresh, empty directory under the system temp dir.
pub fn scratch_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "sprite_composite_it_{}_{}_{label}",
        std::process::id(),
        NEXT_SCRATCH.fetch_add(1, Ordering::Relaxed)
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("scratch directory");
    dir
}

/// Single-row sprite built from RGBA tuples.
pub fn sprite_row(pixels: &[[u8; 4]]) -> RgbaImage {
    let raw = pixels.iter().flatten().copied().collect();
    RgbaImage::from_raw(pixels.len() as u32, 1, raw).expect("buffer matches dimensions")
}

/// A sprite with a transparent border and an opaque striped body.
pub fn bordered_sprite(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([(x * 40 % 256) as u8, (y * 25 % 256) as u8, 128, 255])
        }
    })
}

pub fn write_png(path: &Path, image: &RgbaImage) {
    image.save(path).expect("write fixture");
}

pub fn read_rgba(path: &Path) -> RgbaImage {
    image::open(path).expect("read output").to_rgba8()
}

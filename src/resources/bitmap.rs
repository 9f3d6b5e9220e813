//! 位图读取

use crate::core::error::{AssetError, AssetResult};
use std::path::Path;

/// RGBA8 像素数据，逐行排列，第一行在最上面
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Bitmap {
    /// 1x1 白色，用于没有配置贴图的模型
    pub fn white() -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![255; 4],
        }
    }

    pub fn bytes_per_row(&self) -> u32 {
        4 * self.width
    }
}

pub fn load_bitmap(path: &Path) -> AssetResult<Bitmap> {
    if !path.exists() {
        return Err(AssetError::NotFound {
            path: path.display().to_string(),
        });
    }
    let img = image::open(path).map_err(|e| AssetError::LoadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    tracing::info!(target: "assets", path = %path.display(), width, height, "Loaded bitmap");
    Ok(Bitmap {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_white_fallback() {
        let white = Bitmap::white();
        assert_eq!(white.pixels.len(), 4);
        assert_eq!(white.bytes_per_row(), 4);
    }

    #[test]
    fn test_load_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checker.png");
        let img = image::RgbaImage::from_fn(2, 3, |x, y| {
            if (x + y) % 2 == 0 {
                image::Rgba([255, 0, 0, 255])
            } else {
                image::Rgba([0, 0, 255, 255])
            }
        });
        img.save(&path).unwrap();

        let bitmap = load_bitmap(&path).unwrap();
        assert_eq!((bitmap.width, bitmap.height), (2, 3));
        assert_eq!(bitmap.pixels.len(), 2 * 3 * 4);
        assert_eq!(&bitmap.pixels[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_garbage_file_fails_to_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();
        assert!(matches!(
            load_bitmap(&path),
            Err(AssetError::LoadFailed { .. })
        ));
    }
}

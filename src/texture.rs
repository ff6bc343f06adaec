use std::{fs, path::Path};

use image::ImageFormat;
use log::info;

use crate::error::{Result, ViewerError};

/// Decoded RGBA8 pixels, first row at the top.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TextureData {
    pub fn load_tga(path: impl AsRef<Path>) -> Result<TextureData> {
        let path = path.as_ref();
        info!("Loading texture {}", path.display());
        let bytes = fs::read(path).map_err(|source| ViewerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::decode_tga(&bytes).map_err(|source| ViewerError::Texture {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn decode_tga(bytes: &[u8]) -> std::result::Result<TextureData, image::ImageError> {
        let image = image::load_from_memory_with_format(bytes, ImageFormat::Tga)?.into_rgba8();
        Ok(TextureData {
            width: image.width(),
            height: image.height(),
            pixels: image.into_raw(),
        })
    }

    pub fn solid(colour: [u8; 4]) -> TextureData {
        TextureData {
            width: 1,
            height: 1,
            pixels: colour.to_vec(),
        }
    }

    pub fn texel(&self, x: u32, y: u32) -> [u8; 4] {
        let offset = ((y * self.width + x) * 4) as usize;
        [
            self.pixels[offset],
            self.pixels[offset + 1],
            self.pixels[offset + 2],
            self.pixels[offset + 3],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Uncompressed true-colour TGA, 24 bpp, bottom-left origin.
    fn tga_2x2() -> Vec<u8> {
        let mut bytes = vec![0u8; 18];
        bytes[2] = 2; // image type
        bytes[12] = 2; // width
        bytes[14] = 2; // height
        bytes[16] = 24; // bits per pixel
        // pixels are BGR, bottom row first
        bytes.extend_from_slice(&[0, 0, 255, 0, 255, 0]); // bottom: red, green
        bytes.extend_from_slice(&[255, 0, 0, 255, 255, 255]); // top: blue, white
        bytes
    }

    #[test]
    fn decodes_bottom_up_tga_to_top_down_rgba() {
        let texture = TextureData::decode_tga(&tga_2x2()).unwrap();
        assert_eq!((texture.width, texture.height), (2, 2));
        assert_eq!(texture.pixels.len(), 16);
        assert_eq!(texture.texel(0, 0), [0, 0, 255, 255]);
        assert_eq!(texture.texel(1, 0), [255, 255, 255, 255]);
        assert_eq!(texture.texel(0, 1), [255, 0, 0, 255]);
        assert_eq!(texture.texel(1, 1), [0, 255, 0, 255]);
    }

    #[test]
    fn load_reports_path_on_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.tga");
        fs::write(&path, b"not a tga").unwrap();

        match TextureData::load_tga(&path) {
            Err(ViewerError::Texture { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected texture error, got {other:?}"),
        }
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tile.tga");
        fs::write(&path, tga_2x2()).unwrap();
        assert_eq!(TextureData::load_tga(&path).unwrap().width, 2);
    }

    #[test]
    fn solid_is_single_texel() {
        let texture = TextureData::solid([1, 2, 3, 4]);
        assert_eq!(texture.texel(0, 0), [1, 2, 3, 4]);
    }
}

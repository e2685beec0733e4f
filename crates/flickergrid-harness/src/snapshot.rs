#![forbid(unsafe_code)]

//! PNG export of a software surface.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use flickergrid_core::{PackedRgba, PixelSurface, RasterSurface};
use image::{ImageFormat, RgbaImage};

/// Errors raised while exporting a frame.
#[derive(Debug)]
pub enum SnapshotError {
    /// The surface has no pixels (zero-sized or over the backing limit).
    Empty,
    /// Pixel buffer length disagrees with the backing size.
    Size { width: u32, height: u32 },
    Encode(image::ImageError),
    Io(std::io::Error),
}

impl From<image::ImageError> for SnapshotError {
    fn from(err: image::ImageError) -> Self {
        Self::Encode(err)
    }
}

impl From<std::io::Error> for SnapshotError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "surface is empty"),
            Self::Size { width, height } => {
                write!(f, "pixel buffer does not match {width}x{height}")
            }
            Self::Encode(err) => write!(f, "image encode error: {err}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Empty | Self::Size { .. } => None,
        }
    }
}

/// Copy `surface` into an opaque RGBA image, flattening translucent pixels
/// onto white.
pub fn to_rgba_image(surface: &PixelSurface) -> Result<RgbaImage, SnapshotError> {
    let (width, height) = surface.backing_size();
    if width == 0 || height == 0 {
        return Err(SnapshotError::Empty);
    }
    let mut bytes = Vec::with_capacity(surface.pixels().len() * 4);
    for &px in surface.pixels() {
        let flat = px.over(PackedRgba::WHITE);
        bytes.extend_from_slice(&[flat.r(), flat.g(), flat.b(), 255]);
    }
    RgbaImage::from_raw(width, height, bytes).ok_or(SnapshotError::Size { width, height })
}

/// Encode `surface` as PNG bytes.
pub fn encode_png(surface: &PixelSurface) -> Result<Vec<u8>, SnapshotError> {
    let image = to_rgba_image(surface)?;
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(SnapshotError::Encode)?;
    Ok(out.into_inner())
}

/// Write `surface` to `path` as PNG, creating parent directories.
pub fn save_png(surface: &PixelSurface, path: &Path) -> Result<(), SnapshotError> {
    let bytes = encode_png(surface)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    tracing::debug!(path = %path.display(), "flickergrid.snapshot_written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flickergrid_core::SurfaceSize;
    use pretty_assertions::assert_eq;

    #[test]
    fn png_decodes_to_surface_pixels() {
        let mut surface = PixelSurface::with_size(SurfaceSize::new(3.0, 2.0, 1.0));
        surface.fill_background(PackedRgba::rgb(1, 2, 3));
        let bytes = encode_png(&surface).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(2, 1).0, [1, 2, 3, 255]);
    }

    #[test]
    fn transparent_flattens_to_white() {
        let surface = PixelSurface::with_size(SurfaceSize::new(1.0, 1.0, 1.0));
        let image = to_rgba_image(&surface).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn dpr_scales_image_dimensions() {
        let surface = PixelSurface::with_size(SurfaceSize::new(4.0, 3.0, 2.0));
        let image = to_rgba_image(&surface).unwrap();
        assert_eq!(image.dimensions(), surface.backing_size());
        assert_eq!(image.dimensions(), (8, 6));
    }

    #[test]
    fn empty_surface_is_an_error() {
        assert!(matches!(
            encode_png(&PixelSurface::new()),
            Err(SnapshotError::Empty)
        ));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.png");
        assert!(save_png(&PixelSurface::new(), &path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/frame.png");
        let surface = PixelSurface::with_size(SurfaceSize::new(2.0, 2.0, 1.0));
        save_png(&surface, &path).unwrap();
        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (2, 2));
    }
}

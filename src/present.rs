//! Presenting a finished frame to a host surface.
//!
//! The reference only ever does this one of two ways: blit to a live
//! window surface, or dump VRAM to disk when run offline for debugging.
//! This crate only implements the latter, offline path — anything backed
//! by a real window system (GL, X11, Win32) is the embedder's concern, and
//! is modeled here only as the one-method [`Presenter`] trait it has to
//! satisfy.

use std::io;
use std::path::PathBuf;

use image::{ImageBuffer, Rgba};

/// Consumes one finished frame.
///
/// A frame is a packed RGBA8 buffer, `width * height * 4` bytes, row-major
/// top to bottom. Implementations decide what "display" means for their
/// surface; this crate only ships [`PngPresenter`].
pub trait Presenter {
    /// The error type a failed present reports.
    type Error;

    /// Display one frame.
    fn present(&mut self, width: u32, height: u32, rgba: &[u8]) -> Result<(), Self::Error>;
}

/// A [`Presenter`] that dumps every frame to a PNG file, grounded on the
/// reference's offline VRAM dump path used when run without a real display.
pub struct PngPresenter {
    dir: PathBuf,
    frame_index: u64,
}

impl PngPresenter {
    /// Dump frames as `dir/frame_00000000.png`, `frame_00000001.png`, …
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        PngPresenter { dir: dir.into(), frame_index: 0 }
    }

    /// The path the next call to [`Self::present`] will write to.
    pub fn next_frame_path(&self) -> PathBuf {
        self.dir.join(format!("frame_{:08}.png", self.frame_index))
    }
}

impl Presenter for PngPresenter {
    type Error = io::Error;

    fn present(&mut self, width: u32, height: u32, rgba: &[u8]) -> Result<(), Self::Error> {
        let expected = (width * height * 4) as usize;
        if rgba.len() != expected {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("frame buffer is {} bytes, expected {expected} for {width}x{height} RGBA8", rgba.len()),
            ));
        }

        let image: ImageBuffer<Rgba<u8>, _> = ImageBuffer::from_raw(width, height, rgba.to_vec())
            .expect("length already validated above");

        std::fs::create_dir_all(&self.dir)?;
        let path = self.next_frame_path();
        image.save(&path).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        self.frame_index += 1;
        Ok(())
    }
}

/// A [`Presenter`] that discards every frame; useful as a placeholder when
/// only the TA/CORE pipeline is under test, with no display surface at all.
#[derive(Debug, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    type Error = std::convert::Infallible;

    fn present(&mut self, _width: u32, _height: u32, _rgba: &[u8]) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_presenter_rejects_mismatched_buffer_length() {
        let mut presenter = PngPresenter::new(std::env::temp_dir().join("tilecore-present-test"));
        let err = presenter.present(4, 4, &[0u8; 10]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn png_presenter_writes_a_file_per_frame() {
        let dir = std::env::temp_dir().join(format!("tilecore-present-test-{}", std::process::id()));
        let mut presenter = PngPresenter::new(&dir);
        let pixels = vec![0u8; 2 * 2 * 4];

        let first_path = presenter.next_frame_path();
        presenter.present(2, 2, &pixels).unwrap();
        assert!(first_path.exists());

        let second_path = presenter.next_frame_path();
        assert_ne!(first_path, second_path);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn null_presenter_always_succeeds() {
        let mut presenter = NullPresenter;
        assert!(presenter.present(1, 1, &[0, 0, 0, 0]).is_ok());
    }
}

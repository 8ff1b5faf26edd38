use std::path::{Path, PathBuf};

use crate::capture::domain::frame_source::FrameSource;
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;
use crate::shared::source_info::SourceInfo;

/// Feeds a directory of still images as a frame sequence in filename
/// order, standing in for the camera in demos and tests.
///
/// All frames are reported with the dimensions of the first image;
/// images are not resized, so mixed-size directories surface a decode
/// error rather than silently distorted detections.
pub struct ImageDirSource {
    dir: PathBuf,
    rotation: u32,
    paths: Vec<PathBuf>,
    info: Option<SourceInfo>,
}

impl ImageDirSource {
    pub fn new(dir: &Path) -> Self {
        Self::with_rotation(dir, 0)
    }

    /// A source whose frames need an orientation correction, as portrait
    /// camera captures do.
    pub fn with_rotation(dir: &Path, rotation: u32) -> Self {
        Self {
            dir: dir.to_path_buf(),
            rotation,
            paths: Vec::new(),
            info: None,
        }
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageDirSource {
    fn open(&mut self) -> Result<SourceInfo, Box<dyn std::error::Error>> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| is_image(p))
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(format!("no images found in {}", self.dir.display()).into());
        }

        let first = image::open(&paths[0])?.to_rgb8();
        let (width, height) = first.dimensions();

        let info = SourceInfo {
            width,
            height,
            fps: 0.0,
            total_frames: paths.len(),
            rotation: self.rotation,
            source_path: Some(self.dir.clone()),
        };

        self.paths = paths;
        self.info = Some(info.clone());
        Ok(info)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        if self.info.is_none() {
            return Box::new(std::iter::once(Err("ImageDirSource: not opened".into())));
        }

        let rotation = self.rotation;
        let expected = self.info.as_ref().map(|i| (i.width, i.height));

        Box::new(self.paths.iter().enumerate().map(move |(index, path)| {
            let img = image::open(path)
                .map_err(|e| format!("failed to decode {}: {e}", path.display()))?
                .to_rgb8();
            let (w, h) = img.dimensions();
            if let Some((ew, eh)) = expected {
                if (w, h) != (ew, eh) {
                    return Err(format!(
                        "{} is {w}x{h}, expected {ew}x{eh}",
                        path.display()
                    )
                    .into());
                }
            }
            Ok(Frame::new(img.into_raw(), w, h, 3, index).with_rotation(rotation))
        }))
    }

    fn close(&mut self) {
        self.paths.clear();
        self.info = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use tempfile::TempDir;

    fn write_png(dir: &Path, name: &str, w: u32, h: u32, value: u8) {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(w, h, Rgb([value, value, value]));
        img.save(dir.join(name)).unwrap();
    }

    #[test]
    fn test_open_counts_and_sizes() {
        let tmp = TempDir::new().unwrap();
        write_png(tmp.path(), "b.png", 8, 6, 10);
        write_png(tmp.path(), "a.png", 8, 6, 20);

        let mut source = ImageDirSource::new(tmp.path());
        let info = source.open().unwrap();
        assert_eq!(info.total_frames, 2);
        assert_eq!(info.width, 8);
        assert_eq!(info.height, 6);
        assert_eq!(info.fps, 0.0);
    }

    #[test]
    fn test_frames_in_filename_order() {
        let tmp = TempDir::new().unwrap();
        write_png(tmp.path(), "frame_002.png", 4, 4, 2);
        write_png(tmp.path(), "frame_001.png", 4, 4, 1);
        write_png(tmp.path(), "frame_003.png", 4, 4, 3);

        let mut source = ImageDirSource::new(tmp.path());
        source.open().unwrap();

        let frames: Vec<_> = source.frames().map(|f| f.unwrap()).collect();
        assert_eq!(frames.len(), 3);
        let first_pixels: Vec<u8> = frames.iter().map(|f| f.data()[0]).collect();
        assert_eq!(first_pixels, vec![1, 2, 3]);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.index(), i);
        }
    }

    #[test]
    fn test_non_image_files_ignored() {
        let tmp = TempDir::new().unwrap();
        write_png(tmp.path(), "a.png", 4, 4, 1);
        std::fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let mut source = ImageDirSource::new(tmp.path());
        let info = source.open().unwrap();
        assert_eq!(info.total_frames, 1);
    }

    #[test]
    fn test_empty_dir_is_error() {
        let tmp = TempDir::new().unwrap();
        let mut source = ImageDirSource::new(tmp.path());
        assert!(source.open().is_err());
    }

    #[test]
    fn test_frames_without_open_returns_error() {
        let tmp = TempDir::new().unwrap();
        let mut source = ImageDirSource::new(tmp.path());
        let result = source.frames().next().unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn test_mixed_sizes_surface_an_error() {
        let tmp = TempDir::new().unwrap();
        write_png(tmp.path(), "a.png", 4, 4, 1);
        write_png(tmp.path(), "b.png", 8, 8, 2);

        let mut source = ImageDirSource::new(tmp.path());
        source.open().unwrap();
        let results: Vec<_> = source.frames().collect();
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[test]
    fn test_rotation_tag_applied() {
        let tmp = TempDir::new().unwrap();
        write_png(tmp.path(), "a.png", 4, 4, 1);

        let mut source = ImageDirSource::with_rotation(tmp.path(), 90);
        let info = source.open().unwrap();
        assert_eq!(info.rotation, 90);

        let frame = source.frames().next().unwrap().unwrap();
        assert_eq!(frame.rotation(), 90);
    }
}

use std::path::PathBuf;

/// Describes a frame source: dimensions, rate, and the orientation
/// correction its frames require.
///
/// `fps` is 0 for sources without a natural rate (image directories);
/// `total_frames` is 0 when the count is unknown up front.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub rotation: u32,
    pub source_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction() {
        let info = SourceInfo {
            width: 1280,
            height: 720,
            fps: 30.0,
            total_frames: 900,
            rotation: 90,
            source_path: Some(PathBuf::from("/tmp/dashcam.mp4")),
        };
        assert_eq!(info.width, 1280);
        assert_eq!(info.height, 720);
        assert_eq!(info.fps, 30.0);
        assert_eq!(info.total_frames, 900);
        assert_eq!(info.rotation, 90);
        assert_eq!(info.source_path, Some(PathBuf::from("/tmp/dashcam.mp4")));
    }

    #[test]
    fn test_image_directory_info() {
        // Image directories have no natural rate
        let info = SourceInfo {
            width: 800,
            height: 600,
            fps: 0.0,
            total_frames: 12,
            rotation: 0,
            source_path: None,
        };
        assert_eq!(info.fps, 0.0);
        assert_eq!(info.total_frames, 12);
    }
}

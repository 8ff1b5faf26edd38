use ndarray::ArrayView3;

/// A single camera/video frame: contiguous RGB bytes in row-major order.
///
/// Carries the orientation correction (clockwise degrees) that must be
/// applied before detection. Format conversion happens at I/O boundaries
/// only; the domain layer treats pixel data as opaque.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
    rotation: u32,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
            rotation: 0,
        }
    }

    /// Attaches an orientation correction. `rotation` must be one of
    /// 0, 90, 180, 270 (clockwise degrees).
    pub fn with_rotation(mut self, rotation: u32) -> Self {
        debug_assert!(
            matches!(rotation, 0 | 90 | 180 | 270),
            "rotation must be 0, 90, 180 or 270"
        );
        self.rotation = rotation;
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Pending clockwise orientation correction in degrees.
    pub fn rotation(&self) -> u32 {
        self.rotation
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Returns an upright copy with the orientation correction applied
    /// and `rotation` reset to 0. A frame with no pending rotation is
    /// returned unchanged (still a copy).
    pub fn rotated(&self) -> Frame {
        if self.rotation == 0 {
            return self.clone();
        }

        let w = self.width as usize;
        let h = self.height as usize;
        let ch = self.channels as usize;
        let out_w = match self.rotation {
            90 | 270 => h,
            _ => w,
        };
        let out_h = match self.rotation {
            90 | 270 => w,
            _ => h,
        };

        let mut out = vec![0u8; w * h * ch];
        for row in 0..h {
            for col in 0..w {
                let (dst_row, dst_col) = match self.rotation {
                    90 => (col, h - 1 - row),
                    180 => (h - 1 - row, w - 1 - col),
                    _ => (w - 1 - col, row),
                };
                let src = (row * w + col) * ch;
                let dst = (dst_row * out_w + dst_col) * ch;
                out[dst..dst + ch].copy_from_slice(&self.data[src..src + ch]);
            }
        }

        Frame::new(out, out_w as u32, out_h as u32, self.channels, self.index)
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.rotation(), 0);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    fn test_with_rotation_sets_degrees() {
        let frame = Frame::new(vec![0u8; 12], 2, 2, 3, 0).with_rotation(90);
        assert_eq!(frame.rotation(), 90);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        let data = vec![0u8; 10]; // wrong size for 2x2x3
        Frame::new(data, 2, 2, 3, 0);
    }

    #[test]
    fn test_as_ndarray_shape() {
        let data = vec![0u8; 24]; // 2x4x3
        let frame = Frame::new(data, 4, 2, 3, 0);
        assert_eq!(frame.as_ndarray().shape(), &[2, 4, 3]); // (height, width, channels)
    }

    #[test]
    fn test_rotated_noop_without_pending_rotation() {
        let mut data = vec![0u8; 12];
        data[0] = 7;
        let frame = Frame::new(data.clone(), 2, 2, 3, 1);
        let upright = frame.rotated();
        assert_eq!(upright.data(), &data[..]);
        assert_eq!(upright.width(), 2);
        assert_eq!(upright.height(), 2);
    }

    // 2x1 single-channel frame [A B] makes the mappings easy to follow.
    fn two_pixel_frame() -> Frame {
        Frame::new(vec![10, 20], 2, 1, 1, 0)
    }

    #[test]
    fn test_rotated_90_swaps_dimensions() {
        // [A B] rotated 90 CW becomes a column [A; B]
        let frame = two_pixel_frame().with_rotation(90);
        let upright = frame.rotated();
        assert_eq!(upright.width(), 1);
        assert_eq!(upright.height(), 2);
        assert_eq!(upright.data(), &[10, 20]);
        assert_eq!(upright.rotation(), 0);
    }

    #[test]
    fn test_rotated_180_reverses_pixels() {
        let frame = two_pixel_frame().with_rotation(180);
        let upright = frame.rotated();
        assert_eq!(upright.width(), 2);
        assert_eq!(upright.height(), 1);
        assert_eq!(upright.data(), &[20, 10]);
    }

    #[test]
    fn test_rotated_270_swaps_and_reverses() {
        // [A B] rotated 270 CW becomes a column [B; A]
        let frame = two_pixel_frame().with_rotation(270);
        let upright = frame.rotated();
        assert_eq!(upright.width(), 1);
        assert_eq!(upright.height(), 2);
        assert_eq!(upright.data(), &[20, 10]);
    }

    #[test]
    fn test_rotated_90_rgb_corner() {
        // 2x2 RGB, red pixel at (row 0, col 0): after 90 CW it lands at
        // (row 0, col 1).
        let mut data = vec![0u8; 12];
        data[0] = 255;
        let frame = Frame::new(data, 2, 2, 3, 0).with_rotation(90);
        let upright = frame.rotated();
        let arr = upright.as_ndarray();
        assert_eq!(arr[[0, 1, 0]], 255);
        assert_eq!(arr[[0, 0, 0]], 0);
    }

    #[test]
    fn test_rotated_index_preserved() {
        let frame = Frame::new(vec![0u8; 12], 2, 2, 3, 42).with_rotation(180);
        assert_eq!(frame.rotated().index(), 42);
    }
}

use std::time::Duration;

/// Axis-aligned box in normalized image coordinates.
///
/// Corners are fractions of the frame size, so boxes survive resizing
/// between the model's input resolution and the display resolution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }
}

/// One recognized object instance.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub class_name: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// All detections produced for a single frame, in model output order,
/// plus how long inference took.
#[derive(Clone, Debug)]
pub struct DetectionBatch {
    pub detections: Vec<Detection>,
    pub inference_time: Duration,
    pub frame_index: usize,
}

impl DetectionBatch {
    pub fn empty(frame_index: usize, inference_time: Duration) -> Self {
        Self {
            detections: Vec::new(),
            inference_time,
            frame_index,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bbox_dimensions() {
        let b = BoundingBox::new(0.1, 0.2, 0.5, 0.8);
        assert_relative_eq!(b.width(), 0.4, max_relative = 1e-6);
        assert_relative_eq!(b.height(), 0.6, max_relative = 1e-6);
        let (cx, cy) = b.center();
        assert_relative_eq!(cx, 0.3, max_relative = 1e-6);
        assert_relative_eq!(cy, 0.5, max_relative = 1e-6);
    }

    #[test]
    fn test_iou_disjoint_is_zero() {
        let a = BoundingBox::new(0.0, 0.0, 0.2, 0.2);
        let b = BoundingBox::new(0.5, 0.5, 0.9, 0.9);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_identical_is_one() {
        let b = BoundingBox::new(0.1, 0.1, 0.6, 0.6);
        assert_relative_eq!(b.iou(&b), 1.0, max_relative = 1e-6);
    }

    #[test]
    fn test_iou_half_overlap() {
        // Two unit-height boxes sharing half their width:
        // inter = 0.5, union = 1.5 -> IoU = 1/3
        let a = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let b = BoundingBox::new(0.5, 0.0, 1.5, 1.0);
        assert_relative_eq!(a.iou(&b), 1.0 / 3.0, max_relative = 1e-5);
    }

    #[test]
    fn test_empty_batch() {
        let batch = DetectionBatch::empty(7, Duration::from_millis(12));
        assert!(batch.is_empty());
        assert_eq!(batch.frame_index, 7);
        assert_eq!(batch.inference_time, Duration::from_millis(12));
    }
}

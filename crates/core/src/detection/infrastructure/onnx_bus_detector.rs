/// YOLO bus detector using ONNX Runtime via `ort`.
///
/// Handles letterbox preprocessing, inference, multi-class output decode,
/// and per-class NMS. Model and label resources are loaded by `setup` and
/// released by `clear`; `detect` before `setup` is a `NotReady` error.
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::detection::domain::bus_detector::{BusDetector, DetectorError};
use crate::detection::domain::detection::{BoundingBox, Detection, DetectionBatch};
use crate::shared::frame::Frame;

use super::label_store;

/// Fallback model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// Default confidence threshold.
pub const DEFAULT_CONFIDENCE: f32 = 0.25;

/// NMS IoU threshold, applied within each class.
const NMS_IOU_THRESH: f32 = 0.45;

/// Resources held between `setup` and `clear`.
struct LoadedModel {
    session: ort::session::Session,
    labels: Vec<String>,
    input_size: u32,
}

/// YOLO detector backed by an ONNX Runtime session.
pub struct OnnxBusDetector {
    model_path: PathBuf,
    labels_path: PathBuf,
    confidence: f32,
    loaded: Option<LoadedModel>,
}

impl OnnxBusDetector {
    pub fn new(model_path: &Path, labels_path: &Path, confidence: f32) -> Self {
        Self {
            model_path: model_path.to_path_buf(),
            labels_path: labels_path.to_path_buf(),
            confidence,
            loaded: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.loaded.is_some()
    }
}

impl BusDetector for OnnxBusDetector {
    fn setup(&mut self) -> Result<(), DetectorError> {
        if self.loaded.is_some() {
            return Ok(());
        }

        let labels = label_store::load_labels(&self.labels_path)
            .map_err(|e| DetectorError::Initialization(e.to_string()))?;

        let session = ort::session::Session::builder()
            .and_then(|mut b| b.commit_from_file(&self.model_path))
            .map_err(|e| {
                DetectorError::Initialization(format!(
                    "failed to load model {}: {e}",
                    self.model_path.display()
                ))
            })?;

        // Try to read input size from model metadata (NCHW: [1, 3, H, W])
        let input_size = session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    if shape.len() >= 4 && shape[2] > 0 {
                        Some(shape[2] as u32)
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        log::info!(
            "Detector ready: {} classes, {input_size}px input",
            labels.len()
        );

        self.loaded = Some(LoadedModel {
            session,
            labels,
            input_size,
        });
        Ok(())
    }

    fn detect(&mut self, frame: &Frame) -> Result<DetectionBatch, DetectorError> {
        let loaded = self.loaded.as_mut().ok_or(DetectorError::NotReady)?;

        let upright = frame.rotated();
        let fw = upright.width();
        let fh = upright.height();

        let started = Instant::now();

        // 1. Preprocess: letterbox + normalize -> NCHW float32
        let (input_tensor, scale, pad_x, pad_y) = letterbox(&upright, loaded.input_size);

        // 2. Inference
        let input_value = ort::value::Tensor::from_array(input_tensor)
            .map_err(|e| DetectorError::Inference(e.to_string()))?;
        let outputs = loaded
            .session
            .run(ort::inputs![input_value])
            .map_err(|e| DetectorError::Inference(e.to_string()))?;
        if outputs.len() == 0 {
            return Err(DetectorError::Inference(
                "model produced no outputs".to_string(),
            ));
        }
        let tensor = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| DetectorError::Inference(e.to_string()))?;
        let shape = tensor.shape();

        // YOLO output shape is [1, num_features, num_detections] (transposed)
        // or [1, num_detections, num_features]. Handle both.
        let (num_dets, num_feats) = if shape.len() == 3 {
            if shape[1] < shape[2] {
                (shape[2], shape[1])
            } else {
                (shape[1], shape[2])
            }
        } else {
            return Err(DetectorError::Inference(format!(
                "unexpected model output shape: {shape:?}"
            )));
        };
        let transposed = shape[1] < shape[2];

        let data = tensor
            .as_slice()
            .ok_or_else(|| DetectorError::Inference("cannot get tensor slice".to_string()))?;

        // 3. Decode + per-class NMS + map back to frame coordinates
        let mut raw = decode_rows(
            data,
            num_dets,
            num_feats,
            transposed,
            self.confidence,
            loaded.labels.len(),
        );
        let kept = nms_per_class(&mut raw, NMS_IOU_THRESH);

        let detections = kept
            .into_iter()
            .map(|d| to_detection(&d, &loaded.labels, scale, pad_x, pad_y, fw, fh))
            .collect();

        Ok(DetectionBatch {
            detections,
            inference_time: started.elapsed(),
            frame_index: frame.index(),
        })
    }

    fn clear(&mut self) {
        self.loaded = None;
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Letterbox-resize a frame to `target_size` x `target_size`.
///
/// Returns `(NCHW float32 tensor, scale, pad_x, pad_y)`.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, f32, u32, u32) {
    let fw = frame.width() as f32;
    let fh = frame.height() as f32;
    let target = target_size as f32;

    let scale = (target / fw).min(target / fh);
    let new_w = (fw * scale).round() as u32;
    let new_h = (fh * scale).round() as u32;
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // Padding filled with 114/255 gray, YOLO convention
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray(); // [H, W, C] u8
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    // Nearest-neighbor resize + copy into padded region
    for y in 0..new_h as usize {
        let src_y = ((y as f32 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f32 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (tensor, scale, pad_x, pad_y)
}

// ---------------------------------------------------------------------------
// Decode + NMS
// ---------------------------------------------------------------------------

/// A decoded candidate in letterbox pixel coordinates.
#[derive(Clone, Debug)]
struct RawDetection {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    confidence: f32,
    class_id: usize,
}

/// Decodes YOLOv8-style rows `[cx, cy, w, h, score_0 .. score_{nc-1}]`.
///
/// The best-scoring class per row is kept when it clears `confidence`.
/// Rows with fewer scores than `num_classes` are skipped rather than
/// trusted, since a label/model mismatch would misname every detection.
fn decode_rows(
    data: &[f32],
    num_dets: usize,
    num_feats: usize,
    transposed: bool,
    confidence: f32,
    num_classes: usize,
) -> Vec<RawDetection> {
    let mut raw = Vec::new();
    if num_feats < 4 + num_classes {
        return raw;
    }

    for i in 0..num_dets {
        let at = |f: usize| {
            if transposed {
                data[f * num_dets + i]
            } else {
                data[i * num_feats + f]
            }
        };

        let mut best_class = 0usize;
        let mut best_score = f32::MIN;
        for c in 0..num_classes {
            let score = at(4 + c);
            if score > best_score {
                best_score = score;
                best_class = c;
            }
        }
        if best_score < confidence {
            continue;
        }

        let cx = at(0);
        let cy = at(1);
        let w = at(2);
        let h = at(3);

        raw.push(RawDetection {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
            confidence: best_score,
            class_id: best_class,
        });
    }
    raw
}

/// Greedy NMS within each class: sort by confidence descending, suppress
/// same-class boxes above `iou_thresh`. Boxes of different classes never
/// suppress each other; a line-number plate legitimately overlaps the
/// bus carrying it.
fn nms_per_class(dets: &mut [RawDetection], iou_thresh: f32) -> Vec<RawDetection> {
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; dets.len()];

    for i in 0..dets.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(dets[i].clone());
        for j in (i + 1)..dets.len() {
            if suppressed[j] || dets[j].class_id != dets[i].class_id {
                continue;
            }
            if raw_iou(&dets[i], &dets[j]) > iou_thresh {
                suppressed[j] = true;
            }
        }
    }
    keep
}

fn raw_iou(a: &RawDetection, b: &RawDetection) -> f32 {
    let x1 = a.x1.max(b.x1);
    let y1 = a.y1.max(b.y1);
    let x2 = a.x2.min(b.x2);
    let y2 = a.y2.min(b.y2);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }
    let area_a = (a.x2 - a.x1) * (a.y2 - a.y1);
    let area_b = (b.x2 - b.x1) * (b.y2 - b.y1);
    inter / (area_a + area_b - inter)
}

/// Maps a letterbox-space candidate back to a normalized-frame detection.
fn to_detection(
    d: &RawDetection,
    labels: &[String],
    scale: f32,
    pad_x: u32,
    pad_y: u32,
    frame_w: u32,
    frame_h: u32,
) -> Detection {
    let fw = frame_w as f32;
    let fh = frame_h as f32;
    let unpad = |v: f32, pad: u32| (v - pad as f32) / scale;

    let bbox = BoundingBox::new(
        (unpad(d.x1, pad_x) / fw).clamp(0.0, 1.0),
        (unpad(d.y1, pad_y) / fh).clamp(0.0, 1.0),
        (unpad(d.x2, pad_x) / fw).clamp(0.0, 1.0),
        (unpad(d.y2, pad_y) / fh).clamp(0.0, 1.0),
    );

    Detection {
        class_name: labels[d.class_id].clone(),
        confidence: d.confidence,
        bbox,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

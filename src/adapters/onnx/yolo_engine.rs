use anyhow::{bail, Result};
use image::{imageops::FilterType, RgbImage};
use ndarray::{s, Array4, ArrayView2, ArrayViewD, Axis, Ix2, IxDyn};
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::Value;
use std::fs;

use super::nms::{non_max_suppression, Candidate};
use crate::domain::model::YoloParams;

/// YOLOv8/11 detection export: one input `[1, 3, S, S]`, one output `[1, 4 + classes, anchors]`.
pub struct OnnxYoloEngine {
    session: Session,
}

impl OnnxYoloEngine {
    pub fn load(path: &str) -> Result<Self> {
        let mut builder = Session::builder()?.with_intra_threads(4)?;

        // CUDA is optional; fall back to CPU when the provider cannot be registered.
        let cuda = CUDAExecutionProvider::default().build();
        if let Ok(builder_with_cuda) = builder.clone().with_execution_providers([cuda]) {
            builder = builder_with_cuda;
        }

        let model_bytes = fs::read(path)?;
        let session = builder.commit_from_memory(&model_bytes)?;

        Ok(Self { session })
    }

    /// Runs the model and returns suppressed candidates in `rgb`'s pixel space.
    pub fn infer(&mut self, rgb: &RgbImage, params: &YoloParams) -> Result<Vec<Candidate>> {
        let imgsz = params.input_size as usize;
        let resized = image::imageops::resize(rgb, imgsz as u32, imgsz as u32, FilterType::Triangle);

        let mut input = Array4::<f32>::zeros((1, 3, imgsz, imgsz));
        for (x, y, pixel) in resized.enumerate_pixels() {
            input[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
            input[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
            input[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
        }

        let input_shape = vec![1, 3, imgsz as i64, imgsz as i64];
        let (input_data, _) = input.into_raw_vec_and_offset();
        let input_tensor = Value::from_array((input_shape, input_data))?;

        let outputs = self.session.run(ort::inputs![input_tensor])?;
        let (shape_out, data_out) = outputs[0].try_extract_tensor::<f32>()?;

        let dims: Vec<usize> = shape_out.iter().map(|&x| x as usize).collect();
        if dims.len() != 3 || dims[1] <= 4 {
            bail!("unexpected YOLO output shape {:?}", dims);
        }
        let array_view = ArrayViewD::from_shape(IxDyn(&dims), data_out)?;
        let view = array_view.index_axis(Axis(0), 0).into_dimensionality::<Ix2>()?;

        let sx = rgb.width() as f32 / imgsz as f32;
        let sy = rgb.height() as f32 / imgsz as f32;
        let candidates = decode_candidates(view, sx, sy, params.conf_threshold);

        Ok(non_max_suppression(candidates, params.iou_threshold, params.max_detections))
    }
}

/// Turns a `[4 + classes, anchors]` view of centre-size boxes into scaled corner boxes whose best
/// class score reaches `conf_threshold`.
pub fn decode_candidates(view: ArrayView2<f32>, sx: f32, sy: f32, conf_threshold: f32) -> Vec<Candidate> {
    let num_candidates = view.shape()[1];
    let mut out = Vec::new();

    for i in 0..num_candidates {
        let scores = view.slice(s![4.., i]);
        let Some((class_id, max_score)) = scores
            .iter()
            .copied()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
        else {
            continue;
        };

        if max_score >= conf_threshold {
            let cx = view[[0, i]];
            let cy = view[[1, i]];
            let w = view[[2, i]];
            let h = view[[3, i]];

            out.push(Candidate {
                x1: (cx - w / 2.0) * sx,
                y1: (cy - h / 2.0) * sy,
                x2: (cx + w / 2.0) * sx,
                y2: (cy + h / 2.0) * sy,
                score: max_score,
                class_id,
            });
        }
    }
    out
}

// 该文件是 Oneshot Detect （单图检测） 项目的一部分。
// src/model/yolo.rs - YOLO ONNX 模型（CPU 推理）
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::{Path, PathBuf};

use thiserror::Error;
use tract_onnx::prelude::*;
use tract_onnx::prelude::tract_ndarray::{ArrayView3, ArrayViewD, Ix3};
use tracing::{debug, error, info};

use crate::{
  input::{ImageFileInput, ImageFileInputError},
  model::{DetectItem, DetectResult, Model},
};

const YOLO_INPUT_SIZE: u32 = 640;
const YOLO_IOU_THRESH: f32 = 0.7;
const YOLO_MAX_DET: usize = 300;
const YOLO_BOX_DIMS: usize = 4;
// 端到端导出（YOLOv10 / YOLO26）每行: x1, y1, x2, y2, score, class
const YOLO_END2END_DIMS: usize = 6;

pub struct Yolo {
  model: TypedRunnableModel<TypedModel>,
  input_size: u32,
  iou_threshold: f32,
  max_det: usize,
}

#[derive(Error, Debug)]
pub enum YoloError {
  #[error("failed to load model {path}: {reason:#}")]
  ModelLoad { path: String, reason: TractError },
  #[error("failed to read image: {0}")]
  ImageLoad(#[from] ImageFileInputError),
  #[error("inference failed: {0:#}")]
  Inference(TractError),
  #[error("unexpected model output shape {0:?}")]
  OutputShape(Vec<usize>),
}

pub struct YoloBuilder {
  model_path: PathBuf,
  input_size: u32,
  iou_threshold: f32,
  max_det: usize,
}

impl YoloBuilder {
  pub fn new(model_path: impl AsRef<Path>) -> Self {
    YoloBuilder {
      model_path: model_path.as_ref().to_path_buf(),
      input_size: YOLO_INPUT_SIZE,
      iou_threshold: YOLO_IOU_THRESH,
      max_det: YOLO_MAX_DET,
    }
  }

  /// 模型输入边长（正方形）
  pub fn input_size(mut self, size: u32) -> Self {
    self.input_size = size;
    self
  }

  /// 同类别 NMS 的 IoU 阈值，仅对未内置 NMS 的输出头生效
  pub fn iou_threshold(mut self, iou: f32) -> Self {
    self.iou_threshold = iou;
    self
  }

  pub fn max_det(mut self, max_det: usize) -> Self {
    self.max_det = max_det;
    self
  }

  pub fn build(self) -> Result<Yolo, YoloError> {
    let path = self.model_path.display().to_string();
    info!("加载模型文件: {}", path);

    let size = self.input_size as usize;
    let model = tract_onnx::onnx()
      .model_for_path(&self.model_path)
      .and_then(|model| {
        model.with_input_fact(
          0,
          InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, size, size)),
        )
      })
      .and_then(|model| model.into_optimized())
      .and_then(|model| model.into_runnable())
      .map_err(|reason| {
        error!("模型加载失败: {:#}", reason);
        YoloError::ModelLoad {
          path: path.clone(),
          reason,
        }
      })?;
    info!("模型加载完成");

    debug!(
      "输入尺寸: {}x{}, IoU 阈值: {}, 最大检测数: {}",
      size, size, self.iou_threshold, self.max_det
    );

    Ok(Yolo {
      model,
      input_size: self.input_size,
      iou_threshold: self.iou_threshold,
      max_det: self.max_det,
    })
  }
}

impl Model for Yolo {
  type Error = YoloError;

  fn detect(&self, image: &Path, conf: f64) -> Result<DetectResult, Self::Error> {
    let frame = ImageFileInput::open(image)?.into_letterbox(self.input_size);
    let size = self.input_size as usize;

    // 设置输入
    debug!("设置模型输入");
    let input = Tensor::from_shape(&[1, frame.channels(), size, size], frame.as_nchw())
      .map_err(YoloError::Inference)?;

    // 执行推理
    debug!("执行模型推理");
    let outputs = self
      .model
      .run(tvec!(input.into()))
      .map_err(YoloError::Inference)?;

    // 获取输出
    debug!("获取模型输出");
    let output = outputs
      .first()
      .ok_or_else(|| YoloError::Inference(TractError::msg("model produced no outputs")))?
      .to_array_view::<f32>()
      .map_err(YoloError::Inference)?;

    let items = postprocess(output, conf, self.iou_threshold, self.max_det)?
      .into_iter()
      .map(|item| DetectItem {
        bbox: frame.to_original(item.bbox),
        ..item
      })
      .collect::<Vec<_>>();

    debug!("检测到 {} 个物体", items.len());
    debug!("检测结果: {:?}", items);

    Ok(DetectResult {
      width: frame.orig_width(),
      height: frame.orig_height(),
      items: items.into_boxed_slice(),
    })
  }
}

/// 解析模型输出，返回模型输入坐标系下的候选框
///
/// 支持两种输出：
/// - `[1, 4 + nc, N]` 原始检测头，逐锚点取最高类别分数，再做同类别 NMS；
/// - `[1, N, 6]` 端到端输出，模型已完成 NMS，只做阈值过滤与数量截断。
pub fn postprocess(
  output: ArrayViewD<'_, f32>,
  conf: f64,
  iou_threshold: f32,
  max_det: usize,
) -> Result<Vec<DetectItem>, YoloError> {
  let shape = output.shape().to_vec();
  let output: ArrayView3<'_, f32> = output
    .into_dimensionality::<Ix3>()
    .map_err(|_| YoloError::OutputShape(shape.clone()))?;

  if shape[0] != 1 {
    error!("期望批大小为 1, 实际为 {}", shape[0]);
    return Err(YoloError::OutputShape(shape));
  }

  if shape[2] == YOLO_END2END_DIMS {
    debug!("端到端输出: {} 个候选框", shape[1]);
    Ok(decode_end2end(output, conf, max_det))
  } else if shape[1] > YOLO_BOX_DIMS {
    debug!(
      "原始检测头输出: {} 个锚点, {} 个类别",
      shape[2],
      shape[1] - YOLO_BOX_DIMS
    );
    let candidates = decode_raw_head(output, conf);
    debug!("NMS 前候选框数量: {}", candidates.len());
    Ok(non_max_suppression(candidates, iou_threshold, max_det))
  } else {
    error!("无法识别的输出形状: {:?}", shape);
    Err(YoloError::OutputShape(shape))
  }
}

fn decode_end2end(output: ArrayView3<'_, f32>, conf: f64, max_det: usize) -> Vec<DetectItem> {
  let rows = output.shape()[1];
  let mut items = Vec::new();

  for r in 0..rows {
    let score = output[[0, r, 4]];
    if !(f64::from(score) >= conf) {
      continue;
    }
    let bbox = [
      output[[0, r, 0]],
      output[[0, r, 1]],
      output[[0, r, 2]],
      output[[0, r, 3]],
    ];
    if !is_valid_box(&bbox) {
      continue;
    }
    items.push(DetectItem::new(bbox, output[[0, r, 5]] as u32, score));
    if items.len() >= max_det {
      break;
    }
  }

  items
}

fn decode_raw_head(output: ArrayView3<'_, f32>, conf: f64) -> Vec<DetectItem> {
  let features = output.shape()[1];
  let anchors = output.shape()[2];
  let mut items = Vec::new();

  for a in 0..anchors {
    let (class_id, score) = (YOLO_BOX_DIMS..features).fold(
      (0usize, f32::NEG_INFINITY),
      |(best_cls, best_score), f| {
        let score = output[[0, f, a]];
        if score > best_score {
          (f - YOLO_BOX_DIMS, score)
        } else {
          (best_cls, best_score)
        }
      },
    );

    if !(f64::from(score) >= conf) {
      continue;
    }

    let cx = output[[0, 0, a]];
    let cy = output[[0, 1, a]];
    let w = output[[0, 2, a]];
    let h = output[[0, 3, a]];
    let bbox = [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0];
    if !is_valid_box(&bbox) {
      continue;
    }

    items.push(DetectItem::new(bbox, class_id as u32, score));
  }

  items
}

fn is_valid_box(bbox: &[f32; 4]) -> bool {
  bbox.iter().all(|v| v.is_finite()) && bbox[0] <= bbox[2] && bbox[1] <= bbox[3]
}

/// 同类别贪心 NMS，结果按分数降序排列，最多保留 `max_det` 个
fn non_max_suppression(
  mut candidates: Vec<DetectItem>,
  iou_threshold: f32,
  max_det: usize,
) -> Vec<DetectItem> {
  candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

  let mut kept: Vec<DetectItem> = Vec::new();
  for item in candidates {
    if kept.len() >= max_det {
      break;
    }
    let suppressed = kept
      .iter()
      .any(|k| k.class_id == item.class_id && iou(&k.bbox, &item.bbox) > iou_threshold);
    if !suppressed {
      kept.push(item);
    }
  }
  kept
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
  let ix = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
  let iy = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
  let inter = ix * iy;
  let area_a = (a[2] - a[0]) * (a[3] - a[1]);
  let area_b = (b[2] - b[0]) * (b[3] - b[1]);
  let union = area_a + area_b - inter;
  if union <= 0.0 { 0.0 } else { inter / union }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tract_onnx::prelude::tract_ndarray::{Array3, s};

  /// 构造 `[1, 4 + nc, N]` 输出，每个锚点为 (cx, cy, w, h, 各类别分数)
  fn raw_head(anchors: &[(f32, f32, f32, f32, &[f32])]) -> Array3<f32> {
    let classes = anchors[0].4.len();
    let mut out = Array3::<f32>::zeros((1, YOLO_BOX_DIMS + classes, anchors.len()));
    for (a, (cx, cy, w, h, scores)) in anchors.iter().enumerate() {
      out[[0, 0, a]] = *cx;
      out[[0, 1, a]] = *cy;
      out[[0, 2, a]] = *w;
      out[[0, 3, a]] = *h;
      for (c, score) in scores.iter().enumerate() {
        out[[0, YOLO_BOX_DIMS + c, a]] = *score;
      }
    }
    out
  }

  #[test]
  fn raw_head_picks_best_class_and_converts_to_corners() {
    let out = raw_head(&[(50.0, 40.0, 20.0, 10.0, &[0.1, 0.9, 0.3])]);
    let items = postprocess(out.view().into_dyn(), 0.25, 0.7, 300).unwrap();

    assert_eq!(items, vec![DetectItem::new([40.0, 35.0, 60.0, 45.0], 1, 0.9)]);
  }

  #[test]
  fn raw_head_filters_below_threshold() {
    let out = raw_head(&[
      (10.0, 10.0, 4.0, 4.0, &[0.2, 0.1]),
      (30.0, 30.0, 4.0, 4.0, &[0.25, 0.1]),
    ]);
    let items = postprocess(out.view().into_dyn(), 0.25, 0.7, 300).unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].score, 0.25);
  }

  #[test]
  fn nms_suppresses_same_class_overlap_only() {
    let out = raw_head(&[
      (50.0, 50.0, 20.0, 20.0, &[0.6, 0.0]),
      (51.0, 50.0, 20.0, 20.0, &[0.9, 0.0]),
      (50.0, 50.0, 20.0, 20.0, &[0.0, 0.5]),
      (150.0, 150.0, 20.0, 20.0, &[0.4, 0.0]),
    ]);
    let items = postprocess(out.view().into_dyn(), 0.25, 0.7, 300).unwrap();

    let scores: Vec<f32> = items.iter().map(|i| i.score).collect();
    assert_eq!(scores, vec![0.9, 0.5, 0.4]);
    assert_eq!(items[1].class_id, 1);
  }

  #[test]
  fn max_det_caps_results() {
    let out = raw_head(&[
      (10.0, 10.0, 4.0, 4.0, &[0.5]),
      (30.0, 30.0, 4.0, 4.0, &[0.7]),
      (50.0, 50.0, 4.0, 4.0, &[0.6]),
    ]);
    let items = postprocess(out.view().into_dyn(), 0.25, 0.7, 2).unwrap();

    let scores: Vec<f32> = items.iter().map(|i| i.score).collect();
    assert_eq!(scores, vec![0.7, 0.6]);
  }

  #[test]
  fn end2end_rows_pass_through_in_order() {
    let mut out = Array3::<f32>::zeros((1, 3, YOLO_END2END_DIMS));
    out
      .slice_mut(s![0, 0, ..])
      .assign(&tract_onnx::prelude::tract_ndarray::arr1(&[1.0, 2.0, 11.0, 12.0, 0.8, 3.0]));
    out
      .slice_mut(s![0, 1, ..])
      .assign(&tract_onnx::prelude::tract_ndarray::arr1(&[5.0, 5.0, 6.0, 6.0, 0.1, 0.0]));
    out
      .slice_mut(s![0, 2, ..])
      .assign(&tract_onnx::prelude::tract_ndarray::arr1(&[0.0, 0.0, 9.0, 9.0, 0.3, 7.0]));

    let items = postprocess(out.view().into_dyn(), 0.25, 0.7, 300).unwrap();
    assert_eq!(
      items,
      vec![
        DetectItem::new([1.0, 2.0, 11.0, 12.0], 3, 0.8),
        DetectItem::new([0.0, 0.0, 9.0, 9.0], 7, 0.3),
      ]
    );
  }

  #[test]
  fn end2end_floor_is_compared_in_f64() {
    let mut out = Array3::<f32>::zeros((1, 1, YOLO_END2END_DIMS));
    out
      .slice_mut(s![0, 0, ..])
      .assign(&tract_onnx::prelude::tract_ndarray::arr1(&[0.0, 0.0, 9.0, 9.0, 0.3, 7.0]));

    let floor: f64 = "0.30000002".parse().unwrap();
    assert!(postprocess(out.view().into_dyn(), floor, 0.7, 300).unwrap().is_empty());
    assert_eq!(postprocess(out.view().into_dyn(), 0.3, 0.7, 300).unwrap().len(), 1);
  }

  #[test]
  fn unexpected_shapes_are_rejected() {
    let flat = Array3::<f32>::zeros((1, 3, 10));
    assert!(matches!(
      postprocess(flat.view().into_dyn(), 0.25, 0.7, 300),
      Err(YoloError::OutputShape(_))
    ));

    let batch = Array3::<f32>::zeros((2, 84, 10));
    assert!(matches!(
      postprocess(batch.view().into_dyn(), 0.25, 0.7, 300),
      Err(YoloError::OutputShape(_))
    ));
  }

  #[test]
  fn iou_of_disjoint_and_identical_boxes() {
    let a = [0.0, 0.0, 10.0, 10.0];
    assert_eq!(iou(&a, &a), 1.0);
    assert_eq!(iou(&a, &[20.0, 20.0, 30.0, 30.0]), 0.0);
    assert_eq!(iou(&a, &[5.0, 0.0, 15.0, 10.0]), 50.0 / 150.0);
  }

  #[test]
  fn missing_model_file_fails_to_build() {
    let err = YoloBuilder::new("/no/such/model.onnx").build().err().unwrap();
    assert!(matches!(err, YoloError::ModelLoad { .. }));
    assert!(err.to_string().contains("/no/such/model.onnx"));
  }
}

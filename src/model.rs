// 该文件是 Oneshot Detect （单图检测） 项目的一部分。
// src/model.rs - 模型
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

use std::path::Path;

/// 检测模型接口
///
/// 给定图片路径与置信度阈值，返回原图尺寸与零个或多个候选框。
/// 阈值保持调用方给出的 f64 精度，分数比较时把 f32 分数提升为 f64。
/// 推理在 CPU 上同步完成，失败时不做重试。
pub trait Model {
  type Error;

  fn detect(&self, image: &Path, conf: f64) -> Result<DetectResult, Self::Error>;
}

/// 模型输出的单个候选框
#[derive(Debug, Clone, PartialEq)]
pub struct DetectItem {
  pub class_id: u32,
  pub score: f32,
  pub bbox: [f32; 4], // [x_min, y_min, x_max, y_max]，像素坐标
}

impl DetectItem {
  pub fn new(bbox: [f32; 4], class_id: u32, score: f32) -> Self {
    Self {
      class_id,
      score,
      bbox,
    }
  }
}

/// 一次推理的原始结果
#[derive(Debug, Clone, PartialEq)]
pub struct DetectResult {
  /// 原图宽度
  pub width: u32,
  /// 原图高度
  pub height: u32,
  /// 按模型输出顺序排列的候选框
  pub items: Box<[DetectItem]>,
}

mod yolo;
pub use self::yolo::{Yolo, YoloBuilder, YoloError};

// 该文件是 Oneshot Detect （单图检测） 项目的一部分。
// src/frame.rs - letterbox NCHW 帧定义
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

use image::{RgbImage, imageops::FilterType};

const RGB_CHANNELS: usize = 3;
const LETTERBOX_FILL: f32 = 114.0 / 255.0;

/// 等比缩放并居中填充到 `size x size` 的 NCHW 浮点帧，像素归一化到 [0, 1]
#[derive(Debug, Clone)]
pub struct LetterboxFrame {
  data: Box<[f32]>,
  scale: f32,
  pad_x: u32,
  pad_y: u32,
  orig_width: u32,
  orig_height: u32,
}

impl LetterboxFrame {
  pub fn new(image: &RgbImage, size: u32) -> Self {
    let (orig_width, orig_height) = image.dimensions();
    let scale = (size as f32 / orig_width as f32).min(size as f32 / orig_height as f32);

    let new_w = ((orig_width as f32 * scale).round() as u32).clamp(1, size);
    let new_h = ((orig_height as f32 * scale).round() as u32).clamp(1, size);
    let pad_x = (size - new_w) / 2;
    let pad_y = (size - new_h) / 2;

    let resized;
    let source = if (new_w, new_h) == (orig_width, orig_height) {
      image
    } else {
      resized = image::imageops::resize(image, new_w, new_h, FilterType::Triangle);
      &resized
    };

    let side = size as usize;
    let plane = side * side;
    let mut data = vec![LETTERBOX_FILL; RGB_CHANNELS * plane].into_boxed_slice();

    for (x, y, pixel) in source.enumerate_pixels() {
      let idx = (y + pad_y) as usize * side + (x + pad_x) as usize;
      for c in 0..RGB_CHANNELS {
        data[c * plane + idx] = pixel[c] as f32 / 255.0;
      }
    }

    Self {
      data,
      scale,
      pad_x,
      pad_y,
      orig_width,
      orig_height,
    }
  }

  pub fn channels(&self) -> usize {
    RGB_CHANNELS
  }

  pub fn scale(&self) -> f32 {
    self.scale
  }

  pub fn orig_width(&self) -> u32 {
    self.orig_width
  }

  pub fn orig_height(&self) -> u32 {
    self.orig_height
  }

  pub fn as_nchw(&self) -> &[f32] {
    &self.data
  }

  /// 把模型输入坐标系下的 [x1, y1, x2, y2] 映射回原图，并裁剪到图像范围内
  pub fn to_original(&self, bbox: [f32; 4]) -> [f32; 4] {
    let w = self.orig_width as f32;
    let h = self.orig_height as f32;
    let px = self.pad_x as f32;
    let py = self.pad_y as f32;

    [
      ((bbox[0] - px) / self.scale).clamp(0.0, w),
      ((bbox[1] - py) / self.scale).clamp(0.0, h),
      ((bbox[2] - px) / self.scale).clamp(0.0, w),
      ((bbox[3] - py) / self.scale).clamp(0.0, h),
    ]
  }
}

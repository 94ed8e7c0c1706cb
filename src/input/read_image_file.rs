// 该文件是 Oneshot Detect （单图检测） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use image::{DynamicImage, ImageDecoder, ImageReader, RgbImage};
use thiserror::Error;
use tracing::debug;

use crate::frame::LetterboxFrame;

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("Image loading error: {0}")]
  ImageLoadError(#[from] image::ImageError),
  #[error("Image has zero size: {0}x{1}")]
  EmptyImage(u32, u32),
}

/// 从磁盘解码得到的 RGB 图像
pub struct ImageFileInput {
  image: RgbImage,
}

impl ImageFileInput {
  /// 按文件内容探测格式并解码，统一转换为 RGB8。
  ///
  /// 若文件带有 EXIF 方向信息（手机拍摄的 JPEG 常见），先按该方向旋转或翻转，
  /// 输出尺寸与检测框坐标都以旋转后的图像为准。
  pub fn open(path: &Path) -> Result<Self, ImageFileInputError> {
    let mut decoder = ImageReader::open(path)?
      .with_guessed_format()?
      .into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut image = DynamicImage::from_decoder(decoder)?;
    debug!("图像方向: {:?}", orientation);
    image.apply_orientation(orientation);
    let image: RgbImage = image.into();

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
      return Err(ImageFileInputError::EmptyImage(width, height));
    }
    debug!("读取图像 {}: {}x{}", path.display(), width, height);

    Ok(ImageFileInput { image })
  }

  pub fn width(&self) -> u32 {
    self.image.width()
  }

  pub fn height(&self) -> u32 {
    self.image.height()
  }

  pub fn into_letterbox(self, size: u32) -> LetterboxFrame {
    LetterboxFrame::new(&self.image, size)
  }
}

// 该文件是 Oneshot Detect （单图检测） 项目的一部分。
// src/output.rs - 输出定义
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

use serde::Serialize;
use thiserror::Error;

use crate::normalize::DetectionRecord;

pub trait Render<Output> {
  type Error;
  fn render_result(&mut self, result: &Output) -> Result<(), Self::Error>;
}

impl<Output, R: Render<Output> + ?Sized> Render<Output> for &mut R {
  type Error = R::Error;

  fn render_result(&mut self, result: &Output) -> Result<(), Self::Error> {
    (**self).render_result(result)
  }
}

/// 一次调用的完整输出
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionResult {
  pub width: u32,
  pub height: u32,
  pub detections: Vec<DetectionRecord>,
}

#[derive(Error, Debug)]
pub enum OutputError {
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON serialization error: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("detection {index} has non-finite confidence {conf}")]
  NonFinite { index: usize, conf: f32 },
}

mod json_line;
pub use self::json_line::JsonLineOutput;

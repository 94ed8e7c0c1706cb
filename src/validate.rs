// 该文件是 Oneshot Detect （单图检测） 项目的一部分。
// src/validate.rs - 输入参数校验
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

use std::{fmt, path::Path};

use thiserror::Error;
use tracing::{debug, error};

/// 必须存在的输入文件种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
  Model,
  Image,
}

impl fmt::Display for FileKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FileKind::Model => f.write_str("model"),
      FileKind::Image => f.write_str("image"),
    }
  }
}

#[derive(Error, Debug)]
pub enum ValidateError {
  #[error("{kind} not found: {path}")]
  MissingFile { kind: FileKind, path: String },
  #[error("confidence threshold must be within [0, 1], got {0}")]
  InvalidConfidence(f64),
}

/// 在加载模型之前确认模型文件与图片文件均存在，先检查模型。
///
/// 空路径或非法路径一律视为不存在。只做存在性检查，不读取文件内容。
pub fn ensure_exists(model: &Path, image: &Path) -> Result<(), ValidateError> {
  check_file(FileKind::Model, model)?;
  check_file(FileKind::Image, image)?;
  Ok(())
}

fn check_file(kind: FileKind, path: &Path) -> Result<(), ValidateError> {
  if path.as_os_str().is_empty() || !path.exists() {
    error!("{} 文件不存在: {}", kind, path.display());
    return Err(ValidateError::MissingFile {
      kind,
      path: path.display().to_string(),
    });
  }
  debug!("{} 文件存在: {}", kind, path.display());
  Ok(())
}

/// 置信度阈值必须落在 [0, 1] 内，NaN 同样拒绝。
pub fn ensure_confidence(conf: f64) -> Result<f64, ValidateError> {
  if (0.0..=1.0).contains(&conf) {
    Ok(conf)
  } else {
    Err(ValidateError::InvalidConfidence(conf))
  }
}

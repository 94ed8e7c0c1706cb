// 该文件是 Oneshot Detect （单图检测） 项目的一部分。
// src/task.rs - 推理任务
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

use tracing::info;

use crate::{
  model::Model,
  normalize::normalize,
  output::{DetectionResult, Render},
};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error>;
}

/// 单张图片：推理一次、规范化、输出一次
pub struct OneShotTask {
  conf: f64,
}

impl OneShotTask {
  pub fn new(conf: f64) -> Self {
    OneShotTask { conf }
  }
}

impl<
  I: AsRef<Path>,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  M: Model<Error = ME>,
  O: Render<DetectionResult, Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, model: M, mut output: O) -> Result<(), Self::Error> {
    let image = input.as_ref();
    info!("开始推理: {}", image.display());
    let now = std::time::Instant::now();
    let raw = model.detect(image, self.conf)?;
    let elapsed = now.elapsed();
    info!(
      "推理完成，耗时: {:.2?}，图像尺寸 {}x{}，候选框 {} 个",
      elapsed,
      raw.width,
      raw.height,
      raw.items.len()
    );

    let result = DetectionResult {
      width: raw.width,
      height: raw.height,
      detections: normalize(&raw.items, self.conf),
    };
    info!("保留检测框 {} 个", result.detections.len());

    output.render_result(&result)?;
    Ok(())
  }
}

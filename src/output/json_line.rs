// 该文件是 Oneshot Detect （单图检测） 项目的一部分。
// src/output/json_line.rs - 单行 JSON 输出
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

use std::io::Write;

use tracing::debug;

use crate::output::{DetectionResult, OutputError, Render};

/// 把结果写成一行 JSON 并立即刷新
///
/// 整行先在内存中序列化完成再一次性写出，失败时不会留下半行输出。
pub struct JsonLineOutput<W: Write> {
  writer: W,
}

impl<W: Write> JsonLineOutput<W> {
  pub fn new(writer: W) -> Self {
    JsonLineOutput { writer }
  }

  pub fn into_inner(self) -> W {
    self.writer
  }
}

impl JsonLineOutput<std::io::Stdout> {
  pub fn stdout() -> Self {
    JsonLineOutput::new(std::io::stdout())
  }
}

impl<W: Write> Render<DetectionResult> for JsonLineOutput<W> {
  type Error = OutputError;

  fn render_result(&mut self, result: &DetectionResult) -> Result<(), Self::Error> {
    // serde_json 会把非有限浮点数写成 null，这里提前拒绝
    if let Some((index, record)) = result
      .detections
      .iter()
      .enumerate()
      .find(|(_, record)| !record.conf.is_finite())
    {
      return Err(OutputError::NonFinite {
        index,
        conf: record.conf,
      });
    }

    let mut line = serde_json::to_vec(result)?;
    line.push(b'\n');
    self.writer.write_all(&line)?;
    self.writer.flush()?;

    debug!("写出 {} 字节", line.len());
    Ok(())
  }
}

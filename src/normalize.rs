// 该文件是 Oneshot Detect （单图检测） 项目的一部分。
// src/normalize.rs - 检测结果规范化
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
use tracing::debug;

use crate::model::DetectItem;

/// 对外输出的单个检测框，左上角坐标加宽高，整数像素
///
/// 字段顺序即序列化顺序，属于输出格式的一部分。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionRecord {
  pub x: i64,
  pub y: i64,
  pub w: i64,
  pub h: i64,
  pub conf: f32,
  pub cls: i64,
}

/// 像素坐标取整：四舍六入五成双（round half to even）。
///
/// 例如 `0.5 -> 0`、`1.5 -> 2`、`2.5 -> 2`、`-0.5 -> -0`。
/// 与平台默认的取整方式无关，保证同一输入在任何环境下输出一致。
pub fn round_pixel(v: f32) -> i64 {
  v.round_ties_even() as i64
}

/// 把模型候选框转换为检测记录。
///
/// 按输入顺序逐个处理，不重排、不去重：
/// 分数低于 `conf` 的候选（含 NaN）被丢弃，即使模型已经按同一阈值过滤过；
/// 比较在 f64 下进行，阈值不会因为舍入到 f32 而被放低；
/// `w`、`h` 由未取整的角点差值取整得到，而不是取整后的角点相减。
pub fn normalize(items: &[DetectItem], conf: f64) -> Vec<DetectionRecord> {
  let records: Vec<DetectionRecord> = items
    .iter()
    .filter(|item| f64::from(item.score) >= conf)
    .map(|item| {
      let [x1, y1, x2, y2] = item.bbox;
      DetectionRecord {
        x: round_pixel(x1),
        y: round_pixel(y1),
        w: round_pixel(x2 - x1),
        h: round_pixel(y2 - y1),
        conf: item.score,
        cls: i64::from(item.class_id),
      }
    })
    .collect();

  if records.len() != items.len() {
    debug!(
      "置信度过滤: {} 个候选框中保留 {} 个",
      items.len(),
      records.len()
    );
  }

  records
}

// 该文件是 Oneshot Detect （单图检测） 项目的一部分。
// src/args.rs - 项目参数配置
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

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tracing::Level;

/// 对单张图片运行目标检测模型，并在标准输出打印一行 JSON 结果
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// ONNX 模型文件路径
  #[arg(long, value_name = "FILE")]
  pub model: PathBuf,

  /// 输入图片路径
  #[arg(long, value_name = "FILE")]
  pub image: PathBuf,

  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value = "0.25", value_name = "THRESHOLD", allow_negative_numbers = true)]
  pub conf: f64,

  /// 模型输入边长，至少 32
  #[arg(
    long,
    default_value = "640",
    value_name = "PIXELS",
    value_parser = clap::value_parser!(u32).range(32..)
  )]
  pub imgsz: u32,

  /// NMS IoU 阈值 (0.0 - 1.0)，模型已内置 NMS 时忽略
  #[arg(long, default_value = "0.7", value_name = "THRESHOLD")]
  pub iou: f32,

  /// 最多输出的检测框数量
  #[arg(long, default_value = "300", value_name = "COUNT")]
  pub max_det: usize,

  /// 日志详细程度，可重复（-v, -vv, -vvv），日志只写到标准错误
  #[arg(short, long, action = ArgAction::Count)]
  pub verbose: u8,
}

impl Args {
  pub fn log_level(&self) -> Level {
    match self.verbose {
      0 => Level::WARN,
      1 => Level::INFO,
      2 => Level::DEBUG,
      _ => Level::TRACE,
    }
  }
}

// 该文件是 Oneshot Detect （单图检测） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use oneshot_detect::{
  model::YoloBuilder,
  output::JsonLineOutput,
  task::{OneShotTask, Task},
  validate,
};

// 标准输出只留给结果行；日志与错误信息都写到标准错误，
// main 返回 Err 时以退出码 1 结束。
fn main() -> Result<()> {
  let args = args::Args::parse();

  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_max_level(args.log_level())
    .init();

  info!("模型文件路径: {}", args.model.display());
  info!("输入图片: {}", args.image.display());
  info!("置信度阈值: {}", args.conf);

  validate::ensure_exists(&args.model, &args.image)?;
  let conf = validate::ensure_confidence(args.conf)?;

  let model = YoloBuilder::new(&args.model)
    .input_size(args.imgsz)
    .iou_threshold(args.iou)
    .max_det(args.max_det)
    .build()?;

  OneShotTask::new(conf).run_task(&args.image, model, JsonLineOutput::stdout())
}

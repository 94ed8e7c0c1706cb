//! 集成测试共用的小型 ONNX 模型
//!
//! 模型接收 `images: [1, 3, S, S]`，第一个输出恒为给定的常量张量，
//! 第二个输出是 `images * 0`，只为让输入参与计算图。

#![allow(dead_code)]

use std::path::Path;

use prost::Message;
use tract_onnx::pb::{
  tensor_proto::DataType, tensor_shape_proto::dimension, tensor_shape_proto::Dimension,
  type_proto, GraphProto, ModelProto, NodeProto, OperatorSetIdProto, TensorProto,
  TensorShapeProto, TypeProto, ValueInfoProto,
};

fn float_tensor(name: &str, dims: &[i64], data: &[f32]) -> TensorProto {
  TensorProto {
    name: name.to_string(),
    dims: dims.to_vec(),
    data_type: DataType::Float as i32,
    float_data: data.to_vec(),
    ..Default::default()
  }
}

fn float_value(name: &str, dims: &[i64]) -> ValueInfoProto {
  let dim = dims
    .iter()
    .map(|d| Dimension {
      value: Some(dimension::Value::DimValue(*d)),
      ..Default::default()
    })
    .collect();
  ValueInfoProto {
    name: name.to_string(),
    r#type: Some(TypeProto {
      value: Some(type_proto::Value::TensorType(type_proto::Tensor {
        elem_type: DataType::Float as i32,
        shape: Some(TensorShapeProto { dim }),
      })),
      ..Default::default()
    }),
    ..Default::default()
  }
}

fn node(op_type: &str, inputs: &[&str], output: &str) -> NodeProto {
  NodeProto {
    op_type: op_type.to_string(),
    name: output.to_string(),
    input: inputs.iter().map(|s| s.to_string()).collect(),
    output: vec![output.to_string()],
    ..Default::default()
  }
}

/// 写出一个输入边长为 `input_size`、输出恒为 `data`（形状 `shape`）的模型
pub fn write_constant_model(path: &Path, input_size: i64, shape: &[i64], data: &[f32]) {
  assert_eq!(shape.iter().product::<i64>() as usize, data.len());

  let graph = GraphProto {
    name: "constant-detector".to_string(),
    node: vec![
      node("Add", &["raw", "zero"], "output0"),
      node("Mul", &["images", "zero"], "output1"),
    ],
    initializer: vec![
      float_tensor("raw", shape, data),
      float_tensor("zero", &[1], &[0.0]),
    ],
    input: vec![float_value("images", &[1, 3, input_size, input_size])],
    output: vec![
      float_value("output0", shape),
      float_value("output1", &[1, 3, input_size, input_size]),
    ],
    ..Default::default()
  };

  let model = ModelProto {
    ir_version: 7,
    producer_name: "oneshot-detect-tests".to_string(),
    opset_import: vec![OperatorSetIdProto {
      domain: String::new(),
      version: 13,
    }],
    graph: Some(graph),
    ..Default::default()
  };

  std::fs::write(path, model.encode_to_vec()).unwrap();
}

/// 端到端输出 `[1, N, 6]`，每行 x1, y1, x2, y2, score, class
pub fn write_end2end_model(path: &Path, input_size: i64, rows: &[[f32; 6]]) {
  let data: Vec<f32> = rows.iter().flatten().copied().collect();
  write_constant_model(path, input_size, &[1, rows.len() as i64, 6], &data);
}

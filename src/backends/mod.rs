//! Inference backends for the local segmentation fallback
//!
//! Only ONNX Runtime is supported; without the `onnx` feature the local
//! stage always reports the model as unavailable.

#[cfg(feature = "onnx")]
pub mod onnx;

#[cfg(feature = "onnx")]
pub use self::onnx::{OnnxModelLoader, U2NetSegmenter};

pub mod label_store;
pub mod model_resolver;
pub mod onnx_bus_detector;

pub mod clock;
pub mod http;
pub mod imaging;
pub mod onnx;

pub mod detector;
pub mod model_catalog;
pub mod nms;
pub mod yolo_engine;

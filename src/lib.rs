//! Helmet violation detection server.
//!
//! Uploads go through a YOLO ONNX detector; people labelled as not wearing a helmet are boxed in
//! red on the returned JPEG and added to a per-day counter exposed at `/stats`.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;

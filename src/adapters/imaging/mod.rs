pub mod codec;
pub mod draw;
mod glyphs;

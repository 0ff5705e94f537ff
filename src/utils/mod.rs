pub mod color;
pub mod payload;

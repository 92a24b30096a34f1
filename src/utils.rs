pub mod color;
pub mod segments;

pub mod helix;
pub mod matrix;
pub mod obs;
pub mod tau;

pub mod csv;
pub mod download;
pub mod edf;
pub mod mat;

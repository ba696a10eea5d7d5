//! Access to the PhysioNet eegmmidb motor movement/imagery recordings:
//! remote download, on-disk indexing, annotation tables, windowed segment
//! extraction, spatial correlation, and MAT/CSV export.

pub mod access;
pub mod corr;
pub mod dataset;
pub mod error;
pub mod index;
pub mod io;
pub mod signal;
pub mod table;

pub use error::Error;
pub use signal::Recording;

//! I/O module for reading and writing IGES files

pub mod iges;

pub use iges::{IgesReader, IgesReaderConfiguration, IgesWriter};

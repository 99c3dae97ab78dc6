//! IGES 5.3 ASCII fixed format reading and writing

pub mod directory;
pub mod field_codec;
pub mod reader;
pub mod record;
pub mod writer;

pub use directory::DirectoryEntry;
pub use field_codec::{format_real, format_string, ParameterReader, RecordPacker};
pub use reader::{IgesReader, IgesReaderConfiguration};
pub use record::{Record, Section};
pub use writer::IgesWriter;

//! A reference host: an in-memory project plus a sample library scanned
//! from disk.

mod memory;
mod samples;

pub use memory::MemoryProject;
pub use samples::SampleLibrary;

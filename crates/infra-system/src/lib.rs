// Batchline Infrastructure - System Adapters
// Implements: ItemProcessor (file probe, subprocess)

pub mod command_processor;
pub mod file_probe;

pub use command_processor::CommandProcessor;
pub use file_probe::FileProbeProcessor;

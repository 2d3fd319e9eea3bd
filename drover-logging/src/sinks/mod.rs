pub mod fanout;
pub mod json_lines;
pub mod memory;
pub mod trace;

pub use fanout::FanoutLogger;
pub use json_lines::JsonLinesLogger;
pub use memory::MemoryLogger;
pub use trace::TracingLogger;

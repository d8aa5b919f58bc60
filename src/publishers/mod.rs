pub mod archive;
pub mod console;
pub mod file;

pub use archive::ArchivePublisher;
pub use console::ConsolePublisher;
pub use file::FilePublisher;
pub use crate::traits::publisher::Publisher;

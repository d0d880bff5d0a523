pub mod segment;
pub mod transcript;

pub use segment::{segment, Chunk, Segments};
pub use transcript::{clean_text, load_document, Document};

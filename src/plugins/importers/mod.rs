pub mod file_reader;
pub mod node;

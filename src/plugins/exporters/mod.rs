pub mod file_writer;
pub mod noop;

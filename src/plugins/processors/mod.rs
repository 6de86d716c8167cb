pub mod filter;
pub mod noop;

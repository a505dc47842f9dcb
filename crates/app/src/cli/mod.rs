pub mod args;
pub mod op;
pub mod ops;

pub use ops::{Address, Close, Fetch, Init, Register, Show, Version};

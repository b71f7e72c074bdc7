pub mod args;
pub mod op;
pub mod ops;

pub use ops::{Auth, Check, Ls, Resolve, Serve, Stat, Version};

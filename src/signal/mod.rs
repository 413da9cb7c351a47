mod dirty_set;
mod engine;
mod rate;
mod registry;

pub(crate) use dirty_set::*;
pub use engine::*;
pub use rate::*;
pub use registry::*;

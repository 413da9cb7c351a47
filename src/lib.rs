//! # d-signal
//!
//! Coalescing change notifications for in-process models.
//!
//! Attach handlers to a model, trigger the model when it changes, and the
//! engine calls every handler on a later turn of the tokio runtime with the
//! model's resolved value. Repeated triggers before the next drain collapse
//! into one dispatch, and the number of models drained per turn is capped by
//! a configurable [`Rate`].
//!
//! ```rust,ignore
//! let engine = SignalEngine::new(Settings::load(None)?.dispatch)?;
//! let token = engine.attach(&model, |resolved| println!("{resolved:?}"));
//! engine.trigger(&model);
//! engine.detach(token)?;
//! ```

mod cleanup;
pub mod config;
mod errors;
mod model;
mod resolve;
mod signal;
mod utils;

pub use cleanup::*;
pub use config::*;
pub use errors::*;
pub use model::*;
pub use resolve::*;
pub use signal::*;

pub(crate) use utils::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub(crate) mod test_utils;

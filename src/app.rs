//! Player controller: a typed command set and the `App` model that applies
//! them to the audio handle.

mod command;
mod model;
mod time;

pub use command::Command;
pub use model::*;

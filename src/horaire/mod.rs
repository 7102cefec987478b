pub mod config;
pub mod error;
pub mod io;
pub mod materialize;
pub mod model;
pub mod normalize;
pub mod parse;
pub mod sync;
pub mod time;

pub use error::{HoraireError, Result};

mod types;
pub use types::*;

pub mod error;
pub mod index;
pub mod grid;
pub mod volume;
pub mod sphere;
pub mod pmf;
pub mod tensor;
pub mod direction;
pub mod stopping;
pub mod streamline;
pub mod seeds;
pub mod tracking;
pub mod phantom;
pub mod config;
pub mod io;
pub mod utils;

//! Sheet document state and logic.

mod io;
mod ops;
mod state;

pub use ops::ClipCell;
pub use state::Sheet;

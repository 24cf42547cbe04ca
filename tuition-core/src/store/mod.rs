pub mod merge;
pub mod slice;
mod state;
mod store;

pub use slice::EntitySlice;
pub use state::{AppState, Stored};
pub use store::{Command, Event, Store};

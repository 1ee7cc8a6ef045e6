//! Application layer: the state object, the command session that drives the
//! reducers, and the glue to storage, import/export and the change bus.

pub mod command;
pub mod error;
pub mod session;
pub mod state;

pub use command::{AppCommand, Applied};
pub use error::AppError;
pub use session::{Change, ImportReport, Session};
pub use state::AppState;

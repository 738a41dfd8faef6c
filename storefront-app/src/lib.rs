pub mod error;
pub mod session;

pub use error::SessionError;
pub use session::{OrderScreenSession, ScreenView, SessionDeps};

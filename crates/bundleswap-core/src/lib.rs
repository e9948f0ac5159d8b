mod bundle;
mod error;
mod session;

pub use bundle::BundleName;
pub use error::{FsOperation, UpdateError};
pub use session::{RestartSession, UpdateSession};

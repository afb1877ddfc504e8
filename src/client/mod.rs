//! Client half of the session protocol: a persisted session store, a
//! single-flight refresh coordinator and typed calls over HTTP.

mod coordinator;
mod error;
mod feed_client;
mod persistence;
mod redirect;
mod session;
mod transport;

pub use coordinator::*;
pub use error::*;
pub use feed_client::*;
pub use persistence::*;
pub use redirect::*;
pub use session::*;
pub use transport::*;

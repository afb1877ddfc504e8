use crate::logger::*;

/// Sends the user back to the login surface after an unrecoverable refresh failure.
pub trait LoginRedirect: Send + Sync {
    fn redirect_to_login(&self);
}

/// Headless default: just records that the user must log in again.
#[derive(Debug, Default)]
pub struct LogRedirect;

impl LoginRedirect for LogRedirect {
    fn redirect_to_login(&self) {
        warn!("session ended, login required");
    }
}

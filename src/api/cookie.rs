use crate::domain_model::RefreshToken;
use std::time::Duration;

pub const REFRESH_COOKIE: &str = "refreshToken";

/// Attributes of the cookie that carries the refresh token.
#[derive(Debug, Clone)]
pub struct RefreshCookiePolicy {
    pub secure: bool,
    pub max_age: Duration,
}

impl RefreshCookiePolicy {
    pub fn header_value(&self, token: &RefreshToken) -> String {
        let mut cookie = format!(
            "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
            REFRESH_COOKIE,
            token.0,
            self.max_age.as_secs()
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

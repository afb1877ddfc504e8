mod page;
mod post;
mod token;
mod user;

pub use page::*;
pub use post::*;
pub use token::*;
pub use user::*;

// time

mod clock;

pub use clock::*;

// repo

mod follow_repo;
mod post_repo;
mod repo_error;
mod user_repo;

pub use follow_repo::*;
pub use post_repo::*;
pub use repo_error::*;
pub use user_repo::*;

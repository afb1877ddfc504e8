mod follow_repo_mysql;
mod post_repo_mysql;
mod schema;
mod user_repo_mysql;

pub use follow_repo_mysql::*;
pub use post_repo_mysql::*;
pub use schema::*;
pub use user_repo_mysql::*;

mod util;

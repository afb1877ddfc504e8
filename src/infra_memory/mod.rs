mod clock_manual;
mod follow_repo_memory;
mod post_repo_memory;
mod user_repo_memory;

pub use clock_manual::*;
pub use follow_repo_memory::*;
pub use post_repo_memory::*;
pub use user_repo_memory::*;

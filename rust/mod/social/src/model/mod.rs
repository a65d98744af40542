mod feed;
mod follow;
mod post;
mod stats;
mod status;

pub use feed::*;
pub use follow::*;
pub use post::*;
pub use stats::*;
pub use status::*;

mod user;
mod role;
mod token;

pub use user::*;
pub use role::*;
pub use token::*;

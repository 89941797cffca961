pub mod book;
pub mod reading;
pub mod stats;
pub mod user;

pub use book::*;
pub use reading::*;
pub use stats::*;
pub use user::*;

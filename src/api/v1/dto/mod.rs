pub mod blog;
pub mod newsletter;
pub mod recommendations;
pub mod utility;

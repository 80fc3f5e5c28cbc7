pub mod blog;
pub mod health;
pub mod newsletter;
pub mod recommendations;
pub mod utility;

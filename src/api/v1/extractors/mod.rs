pub mod admin_secret;

pub use admin_secret::{AdminSecret, RequireAdmin};

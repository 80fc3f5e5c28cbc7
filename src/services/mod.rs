pub mod auth;
pub mod blog_query;
pub mod cache;
pub mod drive;
pub mod embedding;
pub mod id_codec;
pub mod mail;
pub mod preview;
pub mod slug;
pub mod tasks;

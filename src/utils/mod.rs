pub mod admin_token;
pub mod cookie;
pub mod jwt;
pub mod slug;
pub mod text;

pub use slug::slugify;
pub use text::{sanitize_optional, sanitize_plain};

pub mod admin;
pub mod enrichment;
pub mod favorite;
pub mod feedback;
pub mod login_limiter;
pub mod moderation;
pub mod photo;
pub mod places;
pub mod profile;
pub mod sitemap;
pub mod storage;
pub mod submission;
pub mod suggest;
pub mod venue;

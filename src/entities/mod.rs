pub mod auth_user;
pub mod diary_entry;
pub mod list;
pub mod list_item;
pub mod review;
pub mod review_tag;
pub mod tag;
pub mod title;
pub mod user_profile;

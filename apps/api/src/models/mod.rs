pub mod activity;
pub mod recipe;
pub mod review;
pub mod user;

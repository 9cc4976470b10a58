pub mod article;
pub mod auth;
pub mod contest;
pub mod event;
pub mod leaderboard;
pub mod profile;
pub mod quiz;
pub mod shared;
pub mod user;

pub mod admin;
pub mod article;
pub mod auth;
pub mod contest;
pub mod event;
pub mod leaderboard;
pub mod problem;
pub mod quiz;
pub mod student;
pub mod user;

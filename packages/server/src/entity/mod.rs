pub mod article;
pub mod contest_problem;
pub mod event;
pub mod event_attempt;
pub mod event_result;
pub mod user;

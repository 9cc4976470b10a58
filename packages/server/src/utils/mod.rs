pub mod account;
pub mod event;
pub mod hash;
pub mod jwt;

//! The quiz submission core: grading, attempt tracking, and the score ledger.

pub mod attempts;
pub mod ledger;
pub mod scoring;

pub mod problem;
pub mod tag;

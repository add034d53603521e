pub mod interpret;
pub mod prompt;
pub mod refine;

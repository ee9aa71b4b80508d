pub mod matching;
pub mod models;
pub mod training;
pub mod utils;

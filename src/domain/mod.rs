pub mod difficulty;
pub mod pool;
pub mod word;

pub mod error;
pub mod generate;
pub mod openai;

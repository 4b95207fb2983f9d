pub mod packaging;
pub mod quote;

pub mod pdf;
pub mod time;

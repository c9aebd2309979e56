pub mod tail;
pub mod touch;

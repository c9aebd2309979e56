pub mod bg;
pub mod fg;
pub mod kill;
pub mod list;

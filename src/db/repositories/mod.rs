pub mod routines;
pub mod sessions;

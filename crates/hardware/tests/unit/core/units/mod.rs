

pub mod cache;

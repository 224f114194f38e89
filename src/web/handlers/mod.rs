pub mod cluster;
pub mod formats;

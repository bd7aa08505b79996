pub mod analysis;
pub mod db;
pub mod models;
pub mod persist;
pub mod scan;
pub mod store;
pub mod summary;

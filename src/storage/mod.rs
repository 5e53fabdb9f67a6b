pub mod blob;
pub mod escape;
pub mod executor;
pub mod migrations;
pub mod sqlite;

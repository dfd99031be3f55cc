pub mod db;
pub mod memory;

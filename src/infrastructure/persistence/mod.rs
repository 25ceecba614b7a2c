pub mod json_file;
pub mod memory;

pub use json_file::JsonFilePostStore;
pub use memory::InMemoryPostStore;

pub mod decode;
pub mod item;
pub mod probe;
pub mod reader;

pub mod ffmpeg;
pub mod memory;
pub mod session;
pub mod writer;

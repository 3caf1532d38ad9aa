pub mod cpu;
pub mod frame;
pub mod layers;
pub mod pool;
pub mod raster;

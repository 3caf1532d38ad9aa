pub mod anim;
pub mod builder;
pub mod model;
pub mod motion;

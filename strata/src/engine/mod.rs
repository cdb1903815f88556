pub mod assets;
pub mod core;
pub mod drawables;
pub mod error;
pub mod rendering;
pub mod scene;

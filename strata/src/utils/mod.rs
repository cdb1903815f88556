pub mod checks;
pub mod sizes;

pub use checks::*;
pub use sizes::*;

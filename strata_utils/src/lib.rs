use std::fmt::Debug;

/// Names the bindings of one uniform bind group.
///
/// Implemented through `#[derive(UniformIndex)]` on a `#[repr(u8)]` enum whose
/// variants are the binding slots in order.
pub trait ShaderUniformIndex: Debug + Copy + Sized {
    const MAX: usize;
    fn index(&self) -> usize;
    fn by_index(index: usize) -> Option<Self>;
    fn name() -> &'static str;
}

/// Panics in debug builds, does nothing in release builds.
#[macro_export]
macro_rules! debug_panic {
    ($($arg:tt)*) => {
        if cfg!(debug_assertions) {
            panic!($($arg)*);
        }
    };
}

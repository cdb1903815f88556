use crate::rendering::{ArrayId, ProgramId, TextureId};

pub const TEXTURE_UNITS: usize = 2;

/// Texture unit of the plain diffuse texture.
pub const DIFFUSE_UNIT: u32 = 0;
/// Texture unit of the array texture.
pub const LAYERED_UNIT: u32 = 1;

/// What the backend currently has bound, as far as the renderer knows.
///
/// `None` means unbound. Every `bind_*` method updates the state and returns
/// whether a bind call has to be issued.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct StateCache {
    program: Option<ProgramId>,
    array: Option<ArrayId>,
    textures: [Option<TextureId>; TEXTURE_UNITS],
}

impl StateCache {
    pub fn reset(&mut self) {
        *self = StateCache::default();
    }

    pub fn is_unbound(&self) -> bool {
        *self == StateCache::default()
    }

    pub fn bind_program(&mut self, program: ProgramId) -> bool {
        replace_if_changed(&mut self.program, program)
    }

    pub fn bind_array(&mut self, array: ArrayId) -> bool {
        replace_if_changed(&mut self.array, array)
    }

    /// Units past the last supported one are never cached and always report a change.
    pub fn bind_texture(&mut self, unit: u32, texture: TextureId) -> bool {
        match self.textures.get_mut(unit as usize) {
            Some(slot) => replace_if_changed(slot, texture),
            None => true,
        }
    }

    pub fn program(&self) -> Option<ProgramId> {
        self.program
    }

    pub fn array(&self) -> Option<ArrayId> {
        self.array
    }

    pub fn texture(&self, unit: u32) -> Option<TextureId> {
        self.textures.get(unit as usize).copied().flatten()
    }
}

fn replace_if_changed<T: PartialEq>(slot: &mut Option<T>, value: T) -> bool {
    if slot.as_ref() == Some(&value) {
        return false;
    }
    *slot = Some(value);
    true
}

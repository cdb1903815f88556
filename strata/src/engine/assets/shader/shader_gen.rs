use crate::assets::ShaderStage;

const FRAME_GROUP: &str = include_str!("shaders/groups/frame.wgsl");
const TEXTURE_GROUP: &str = include_str!("shaders/groups/textures.wgsl");
const DEFAULT_VERTEX: &str = include_str!("shaders/default_vertex.wgsl");
const FRAGMENT_TEMPLATE: &str = include_str!("shaders/fragment_template.wgsl");
const FLAT_COLOR: &str = include_str!("shaders/flat_color.wgsl");

/// The line in the fragment template that is replaced with injected fragment code.
///
/// Injected code runs inside `fs_main` after `var color = base_color(in);` and
/// before `color` is returned, so it can read the interpolated `in` and
/// rewrite `color`.
pub const FRAGMENT_PLACEHOLDER: &str = "#fragment";

/// Prepends the engine's binding declarations for the given stage.
pub fn with_groups(stage: ShaderStage, body: &str) -> String {
    let mut generated = String::with_capacity(FRAME_GROUP.len() + TEXTURE_GROUP.len() + body.len() + 2);

    generated.push_str(FRAME_GROUP);
    generated.push('\n');

    if stage == ShaderStage::Fragment {
        generated.push_str(TEXTURE_GROUP);
        generated.push('\n');
    }

    generated.push_str(body);
    generated
}

pub fn default_vertex() -> String {
    with_groups(ShaderStage::Vertex, DEFAULT_VERTEX)
}

pub fn default_fragment() -> String {
    inject_fragment("")
}

pub fn flat_color_fragment() -> String {
    with_groups(ShaderStage::Fragment, FLAT_COLOR)
}

/// Substitutes `code` for the placeholder line of the fragment template.
///
/// This is a plain text replacement of the template's placeholder. A
/// placeholder that appears inside `code` is left as it is.
pub fn inject_fragment(code: &str) -> String {
    let template = FRAGMENT_TEMPLATE.replace(FRAGMENT_PLACEHOLDER, code);
    with_groups(ShaderStage::Fragment, &template)
}

#![allow(clippy::unwrap_used)]

use crate::assets::ShaderSource;
use crate::utils::validate_wgsl_source;

fn assert_valid(source: ShaderSource) {
    let (vertex, fragment) = source.resolve().unwrap();

    for stage in [vertex, fragment] {
        if let Err(e) = validate_wgsl_source(&stage.code) {
            panic!("{} {} stage is invalid:\n{}", source.name, stage.stage, e.emit_to_string(&stage.code));
        }
    }
}

#[test]
fn default_program() {
    assert_valid(ShaderSource::default_program());
}

#[test]
fn flat_color() {
    assert_valid(ShaderSource::flat_color());
}

#[test]
fn injected_fragment() {
    assert_valid(ShaderSource::injected("Tinted", "color = vec4<f32>(color.rgb * 0.5, color.a);"));
}

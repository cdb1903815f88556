use strata::assets::shader_gen::{FRAGMENT_PLACEHOLDER, inject_fragment};
use strata::assets::{ShaderSource, ShaderStage};
use strata::error::RenderError;
use strata::rendering::{AssetCache, BackendCall, GpuContext, RecordingBackend, RenderConfig};

mod common;

#[test]
fn injection_replaces_the_placeholder() {
    let snippet = "color = vec4<f32>(color.rgb * 0.5, color.a);";
    let fragment = inject_fragment(snippet);

    assert!(fragment.contains(snippet));
    assert!(!fragment.contains(FRAGMENT_PLACEHOLDER));
    assert!(fragment.contains("fn fs_main"));
    assert!(fragment.contains("t_diffuse"));
}

#[test]
fn injected_source_resolves_to_the_default_vertex() {
    let injected = ShaderSource::injected("Dim", "color = color * 0.5;");
    let default = ShaderSource::default_program();

    let (vertex, fragment) = injected.resolve().unwrap();
    let (default_vertex, default_fragment) = default.resolve().unwrap();

    assert_eq!(vertex, default_vertex);
    assert_eq!(vertex.stage, ShaderStage::Vertex);
    assert_eq!(fragment.stage, ShaderStage::Fragment);
    assert_ne!(fragment.content_hash(), default_fragment.content_hash());
}

#[test]
fn empty_stages_are_missing() {
    let no_vertex = ShaderSource::new("Broken", "  \n", "@fragment fn fs_main() {}");
    assert!(matches!(
        no_vertex.resolve(),
        Err(RenderError::MissingShaderSource {
            stage: ShaderStage::Vertex
        })
    ));

    let no_fragment = ShaderSource::injected("Broken", "");
    assert!(matches!(
        no_fragment.resolve(),
        Err(RenderError::MissingShaderSource {
            stage: ShaderStage::Fragment
        })
    ));
}

#[test]
fn built_in_programs_pass_validation() {
    common::init_logging();

    let backend = RecordingBackend::new().validating_shaders();
    let log = backend.log();
    let ctx = GpuContext::new(backend);
    let assets = AssetCache::new(&ctx, &RenderConfig::default()).unwrap();

    assets.program(&ShaderSource::flat_color()).unwrap();
    assets
        .program(&ShaderSource::injected("Tint", "color = color * vec4<f32>(1.0, 0.8, 0.8, 1.0);"))
        .unwrap();

    assert_eq!(log.count(|c| matches!(c, BackendCall::CreateProgram { .. })), 3);
}

#[test]
fn invalid_shaders_fail_to_compile() {
    common::init_logging();

    let backend = RecordingBackend::new().validating_shaders();
    let log = backend.log();
    let ctx = GpuContext::new(backend);
    let assets = AssetCache::new(&ctx, &RenderConfig::default()).unwrap();
    log.clear();

    let result = assets.program(&ShaderSource::injected("Typo", "color = colour;"));

    match result {
        Err(RenderError::ShaderCompile { label, message }) => {
            assert!(label.starts_with("Typo"));
            assert!(!message.is_empty());
        }
        other => panic!("expected a compile error, got {other:?}"),
    }
    assert_eq!(log.count(|c| matches!(c, BackendCall::CreateProgram { .. })), 0);
    assert_eq!(assets.programs.live_count(), 1);
}

#[test]
fn stage_names() {
    assert_eq!(ShaderStage::Vertex.to_string(), "vertex");
    assert_eq!(ShaderStage::Fragment.entry_point(), "fs_main");
}

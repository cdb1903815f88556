#![allow(dead_code)]

use std::sync::Once;
use strata::assets::Geometry;
use strata::engine::core::Vertex3D;
use strata::rendering::{AssetCache, BackendLimits, CallLog, GpuContext, RecordingBackend, RenderConfig};
use tracing_subscriber::EnvFilter;

pub fn init_logging() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub struct TestGpu {
    pub ctx: GpuContext,
    pub log: CallLog,
    pub assets: AssetCache,
}

pub fn gpu() -> TestGpu {
    gpu_with(RecordingBackend::new(), &RenderConfig::default())
}

pub fn gpu_with(backend: RecordingBackend, config: &RenderConfig) -> TestGpu {
    init_logging();

    let log = backend.log();
    let ctx = GpuContext::new(backend);
    let assets = AssetCache::new(&ctx, config).unwrap();
    log.clear();

    TestGpu { ctx, log, assets }
}

pub fn limits_without_u8_indices() -> BackendLimits {
    BackendLimits {
        supports_u8_indices: false,
        ..BackendLimits::default()
    }
}

pub fn quad_vertices(offset: f32) -> Vec<Vertex3D> {
    vec![
        Vertex3D::basic(offset, 0.0, 0.0, 0.0, 0.0),
        Vertex3D::basic(offset + 1.0, 0.0, 0.0, 1.0, 0.0),
        Vertex3D::basic(offset + 1.0, 1.0, 0.0, 1.0, 1.0),
        Vertex3D::basic(offset, 1.0, 0.0, 0.0, 1.0),
    ]
}

/// Two triangles sharing an edge, indexed with 32-bit indices.
pub fn quad(offset: f32) -> Geometry {
    Geometry::indexed(quad_vertices(offset), vec![0u32, 1, 2, 0, 2, 3])
}

pub fn triangle() -> Geometry {
    Geometry::new(vec![
        Vertex3D::basic(0.0, 0.0, 0.0, 0.0, 0.0),
        Vertex3D::basic(1.0, 0.0, 0.0, 1.0, 0.0),
        Vertex3D::basic(0.0, 1.0, 0.0, 0.0, 1.0),
    ])
}

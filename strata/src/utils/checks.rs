use naga::WithSpan;
use naga::front::wgsl;
use naga::front::wgsl::ParseError;
use naga::valid::{Capabilities, ModuleInfo, ValidationError, ValidationFlags, Validator};

#[derive(Debug)]
pub enum ShaderValidError {
    Parse(ParseError),
    ValidationError(WithSpan<ValidationError>),
}

impl ShaderValidError {
    /// Renders the error against the source it was produced from.
    pub fn emit_to_string(&self, source: &str) -> String {
        match self {
            ShaderValidError::Parse(e) => e.emit_to_string(source),
            ShaderValidError::ValidationError(e) => e.emit_to_string(source),
        }
    }
}

pub fn validate_wgsl_source(shader: &str) -> Result<ModuleInfo, ShaderValidError> {
    let module = wgsl::parse_str(shader).map_err(ShaderValidError::Parse)?;
    let mut validator = Validator::new(ValidationFlags::all(), Capabilities::all());
    validator
        .validate(&module)
        .map_err(ShaderValidError::ValidationError)
}

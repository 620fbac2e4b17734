pub mod decode;
pub mod tracing;

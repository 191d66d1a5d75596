pub mod chroma;
pub mod mask;
pub mod model;

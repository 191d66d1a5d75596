pub mod blur;
pub mod kernel;

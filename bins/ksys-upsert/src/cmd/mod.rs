pub mod build;
pub mod stream;

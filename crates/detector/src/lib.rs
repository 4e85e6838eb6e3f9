pub mod annotate;
pub mod backend;
pub mod labels;
pub mod model;
pub mod processing;

pub use backend::{ExecutionProvider, InferenceBackend, InferenceOutput};
pub use labels::ClassNames;
pub use model::{Model, ModelOptions, Prediction};
pub use processing::post::Detection;

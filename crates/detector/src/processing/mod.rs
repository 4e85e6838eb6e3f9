pub mod post;
pub mod pre;

pub use post::{Detection, PostProcessor};
pub use pre::{PreProcessor, TransformParams};

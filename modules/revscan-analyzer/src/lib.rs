pub mod aggregator;
pub mod classifier;
pub mod collector;
#[cfg(feature = "local-model")]
pub mod model;
pub mod normalizer;
pub mod sink;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use aggregator::Analyzer;
pub use classifier::{Classifier, InferenceContext, LabelDecoder};
pub use collector::ReviewCollector;
pub use normalizer::normalize;

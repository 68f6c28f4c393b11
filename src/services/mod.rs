pub mod classifier;
pub mod dataset_writer;
pub mod normalizer;

pub use classifier::{Classifier, ClassifierArtifact, SpamClassifier};
pub use dataset_writer::{DatasetRow, DatasetWriter, WriteReport};
pub use normalizer::TextNormalizer;

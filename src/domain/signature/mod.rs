//! Prompt signatures: canonical identity tokens plus embedding fingerprints

mod generator;
mod normalizer;

pub use generator::{PromptSignature, SignatureGenerator};
pub use normalizer::{DefaultNormalizer, TextNormalizer};

//! Inference backend clients

mod http_client;
mod ollama;

pub use http_client::{HttpClient, HttpClientTrait, HttpError};
pub use ollama::{DEFAULT_OLLAMA_BASE_URL, OllamaGenerator};

#[cfg(test)]
pub use http_client::mock::MockHttpClient;

/*
[INPUT]:  HTTP client configuration and API endpoints
[OUTPUT]: HTTP responses and typed API results
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod authenticated;
pub mod challenge;
pub mod client;
pub mod error;

pub use error::{AuthError, Result};

pub use authenticated::{AuthenticatedClient, RequestOptions};
pub use challenge::ChallengeClient;
pub use client::{ApiClient, ClientConfig, DEFAULT_API_BASE_URL};

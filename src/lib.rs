//! Consumer-driven contract testing harness.
//!
//! A consumer test declares the interactions it expects from a provider,
//! exercises its own client code against an in-process mock server, and
//! finalizes the exchange into a pact file. A provider test later replays
//! that file against the real implementation:
//!
//! ```no_run
//! use pact_harness::{
//!     Interaction, InteractionRequest, InteractionResponse, Method, PactSession,
//!     SessionConfiguration,
//! };
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), pact_harness::Error> {
//! let mut session =
//!     PactSession::start("PactUI", "Projects Provider", 1234, SessionConfiguration::new())?;
//!
//! session
//!     .add_interactions(vec![Interaction::new(
//!         "a request for projects",
//!         InteractionRequest::new(Method::Get, "/projects")
//!             .header("Accept", "application/json"),
//!         InteractionResponse::new(200).body(json!({ "reply": "hello" })),
//!     )
//!     .given("i have a list of projects")])
//!     .await?;
//!
//! // ... issue real requests against session.server_url() ...
//!
//! session.verify()?;
//! session.finalize()?;
//! # Ok(())
//! # }
//! ```

mod configuration;
mod data;
mod error;
mod http_client;
mod matching;
mod mock_server;
mod pact_file;
mod session;
mod util;
mod verifier;

pub use configuration::{SessionConfiguration, VerifyConfiguration};
pub use data::{
    Interaction, InteractionRequest, InteractionResponse, Method, RequestData, ResponseData,
};
pub use error::Error;
pub use http_client::{HttpClient, HyperHttpClient};
pub use matching::{match_response, BodyMatching, MatchFailure};
pub use mock_server::{ExpectationReport, MockServer};
pub use pact_file::{Pact, PactMetadata, Participant, DEFAULT_SPEC_VERSION};
pub use session::{PactSession, SessionState};
pub use verifier::{
    InteractionOutcome, InteractionResult, ProviderVerifier, VerificationReport,
};

//! Polishr Client Library
//!
//! Streaming text polishing against OpenAI-compatible chat completion
//! APIs. Submit text with a transformation mode (grammar improvement,
//! rephrasing or translation), watch the result arrive delta by delta,
//! and get a word-aligned diff against the original once it completes.
//!
//! # Features
//!
//! - **Streaming**: incremental decoding of the provider's line-delimited
//!   frames, robust to arbitrary chunk splits
//! - **Sessions**: one observable, cancellable request at a time, with
//!   superseding starts, reset and explicit retry
//! - **Diff**: Myers alignment with semantic cleanup
//! - **Error classification**: stable messages for credential, rate-limit
//!   and missing-model failures
//! - **Observability**: tracing, structured logging, session metrics
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use polishr_client::{PolishMode, PolishrClient, SessionStatus};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = PolishrClient::from_env()?;
//!     let session = client.session();
//!
//!     session.start(client.request("The cat sit on the mat.", PolishMode::Improve));
//!     let done = session.wait_until_settled().await;
//!
//!     match done.status() {
//!         SessionStatus::Completed => {
//!             println!("{}", done.explanation());
//!             println!("{}", done.final_text());
//!         }
//!         SessionStatus::Failed => eprintln!("{}", done.error().unwrap_or_default()),
//!         _ => {}
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Observing Deltas
//!
//! ```rust,no_run
//! use polishr_client::{PolishMode, PolishrClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = PolishrClient::from_env()?;
//!     let session = client.session();
//!     let mut updates = session.subscribe();
//!
//!     session.start(client.request("我今天很高兴", PolishMode::Translate));
//!
//!     while updates.changed().await.is_ok() {
//!         let snapshot = updates.borrow_and_update().clone();
//!         println!("{}", snapshot.raw_text());
//!         if !snapshot.is_streaming() {
//!             break;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod client;
pub mod config;
pub mod diff;
pub mod envelope;
pub mod errors;
pub mod observability;
pub mod prompts;
pub mod services;
pub mod session;
pub mod transport;
pub mod types;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

pub use client::{PolishrClient, PolishrClientBuilder};
pub use config::{ProviderConfig, ProviderConfigBuilder, ProviderPreset, PROVIDER_PRESETS};
pub use diff::{compute_diff, has_changes, DiffKind, DiffSegment, DiffStats};
pub use envelope::{parse_envelope, Envelope};
pub use errors::{PolishError, PolishResult};
pub use session::{PolishRequest, Session, SessionOrchestrator, SessionStatus};
pub use types::history::HistoryRecord;
pub use types::mode::PolishMode;

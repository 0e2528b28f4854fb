//! Polish sessions.
//!
//! [`Session`] is the observable record of one transformation attempt and
//! [`SessionOrchestrator`] drives it: it issues the request, applies
//! deltas as they stream in, and on completion parses the envelope and
//! computes the diff.
//!
//! ```no_run
//! use std::sync::Arc;
//! use polishr_client::config::ProviderConfig;
//! use polishr_client::services::PolishService;
//! use polishr_client::session::{PolishRequest, SessionOrchestrator};
//! use polishr_client::transport::HttpTransportImpl;
//! use polishr_client::types::mode::PolishMode;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = Arc::new(PolishService::new(Arc::new(HttpTransportImpl::new()?)));
//! let orchestrator = SessionOrchestrator::new(service);
//!
//! let config = ProviderConfig::from_env()?;
//! orchestrator.start(PolishRequest::new("The cat sit on the mat.", PolishMode::Improve, config));
//!
//! let session = orchestrator.wait_until_settled().await;
//! println!("{}", session.final_text());
//! # Ok(())
//! # }
//! ```

mod orchestrator;
mod state;

pub use orchestrator::{CompletionHook, SessionOrchestrator, SessionOrchestratorBuilder};
pub use state::{PolishRequest, Session, SessionStatus};

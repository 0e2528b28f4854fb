//! Provider-facing services.

mod polish;

pub use polish::PolishService;

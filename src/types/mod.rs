//! Wire and domain types.

pub mod chat;
pub mod history;
pub mod mode;

// Application layer: the ledger store every presentation surface talks to.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;

pub mod application;
pub mod cli;
pub mod domain;
pub mod http;
pub mod storage;

pub use application::LedgerStore;
pub use domain::*;

// Utility functions

pub mod http;
pub mod logger;
pub mod retry;

pub use http::*;
pub use logger::*;
pub use retry::*;

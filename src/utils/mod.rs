//! The `utils` module holds the pieces shared by every other module: the error
//! types returned across module boundaries and the logging bootstrap.

pub mod error;
pub mod logging;

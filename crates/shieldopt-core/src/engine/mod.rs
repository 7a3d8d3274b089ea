pub mod cancel;
pub mod config;
pub mod error;
pub mod history;
pub mod objective;
pub mod optimizer;
pub mod score;
pub mod simulator;
pub mod x0;

pub use error::EngineError;

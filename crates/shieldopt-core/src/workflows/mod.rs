pub mod optimize;

pub use optimize::{RunReport, run};

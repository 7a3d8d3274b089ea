//! # Shieldopt Core Library
//!
//! A library for black-box optimization of multi-layer shield configurations:
//! an ordered stack of (material, thickness) layers is encoded into a
//! fixed-dimension numeric vector, evaluated through an external physics
//! simulator, and iteratively improved under thickness, weight, stiffness and
//! cost constraints.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a
//! clear separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Stateless data models (materials catalog,
//!   search space, shield aggregates), pure computation (rotation encoding,
//!   trim/repair, constraint predicates, feasibility analysis) and file I/O
//!   utilities (KPI and geometry files).
//!
//! - **[`engine`]: The Logic Core.** This stateful layer orchestrates the
//!   optimization loop: run configuration, history checkpointing, initial
//!   point construction, the simulator seam, per-iteration objective
//!   evaluation and the ask/tell optimizer contract.
//!
//! - **[`workflows`]: The Public API.** The highest-level, user-facing layer.
//!   It ties `engine` and `core` together into one resumable optimization
//!   run and is the entry point for end-users of the library.

pub mod core;
pub mod engine;
pub mod workflows;

// SPDX-License-Identifier: MIT

//! Adapters binding the workflow engine to the outside world: version
//! control (C3), the embedded toolchain (C4), a remote language model
//! (C5), and project manifest scanning (C11). Every subprocess call in
//! this crate goes through a single bounded-timeout runner.

pub mod dependency_resolver;
pub mod llm;
pub mod repository;
pub mod subprocess;
pub mod toolchain;

pub use llm::{FixResponse, LlmAdapter, LlmError};
pub use repository::{CloneResult, DiffEntry, DiffResult, RepositoryManager, UpdateResult};
pub use subprocess::{run_with_timeout, SubprocessError};
pub use toolchain::{BuildResult, DoctorReport, FlashResult, SimulationResult, ToolchainAdapter};

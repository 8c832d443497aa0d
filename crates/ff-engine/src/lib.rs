// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ff-engine: the event bus, the agent action handlers, the workflow DAG
//! scheduler, and the build orchestrator that ties them to persisted
//! state.

pub mod bus;
pub mod handlers;
pub mod orchestrator;
pub mod workflow;

pub use bus::{BusError, ChannelSubscriber, EventBus, EventSubscriber};
pub use handlers::{HandlerContext, Issue};
pub use orchestrator::{Orchestrator, OrchestratorError};
pub use workflow::{execute_workflow, WorkflowResult};

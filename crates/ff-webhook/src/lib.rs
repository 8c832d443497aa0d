// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ff-webhook: inbound delivery verification, parsing, and the
//! build-trigger decision that bridges a forge's webhook to C8.

pub mod intake;
pub mod payload;
pub mod signature;

pub use intake::{Delivery, IntakeError, IntakeOutcome, WebhookIntake};
pub use payload::CommitInfo;

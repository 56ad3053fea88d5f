//! Core intake logic for the patient intake platform.
//!
//! Implements the slot-filling state machine that collects a fixed set of
//! patient fields, the heuristic address validator, the mock appointment
//! slot generator, and the tool capability set exposed to a driving agent.
//!
//! Transport is someone else's problem: the telephony webhook driver and the
//! voice-pipeline driver in `intake-server` are thin adapters over the nine
//! operations defined here. Suspension between steps (waiting for the next
//! utterance or the next webhook) is owned by those transports; every
//! operation here runs to completion.

pub mod address;
pub mod notify;
pub mod session;
pub mod slots;
pub mod tools;

pub use address::{validate, AddressVerdict};
pub use notify::{IntakeNotifier, NullNotifier};
pub use session::IntakeSession;
pub use slots::{generate, Provider, PROVIDER_ROSTER};
pub use tools::{invoke, ToolError, ToolName};

//! SDLC copilot core: answers chat queries about projects moving through a
//! six-phase delivery lifecycle.
//!
//! ```text
//!             ┌────────────┐   ┌──────────────────┐   ┌────────────────┐
//! query ────▶ │ classifier │──▶│ context          │──▶│ router         │──▶ reply
//!             │ (rules)    │   │  store ║ index   │   │ (strategies,   │
//!             └────────────┘   └──────────────────┘   │  knowledge,    │
//!                                                     │  llm)          │
//!                                                     └───────┬────────┘
//!                                                             ▼
//!                                                        recorder ──▶ index
//! ```
//!
//! [`service::ChatService`] wires the stages together; [`workspace::Workspace`]
//! opens the on-disk store, index and config under a root directory.

pub mod analysis;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod context;
pub mod documents;
pub mod error;
pub mod index;
pub mod io;
pub mod knowledge;
pub mod llm;
pub mod paths;
pub mod phase;
pub mod project;
pub mod recorder;
pub mod router;
pub mod rules;
pub mod service;
pub mod store;
pub mod strategies;
pub mod types;
pub mod workspace;

#[cfg(test)]
mod testing;

pub use error::{CopilotError, Result};
pub use service::{ChatRequest, ChatResponse, ChatService};
pub use workspace::Workspace;

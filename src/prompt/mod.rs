//! Prompt request cycle: capture the panes, submit them to the backend and
//! stream the answer back into the output pane.

mod client;
mod cycle;
mod encode;
mod poll;

use thiserror::Error;

pub use client::{EndpointSettings, HttpPromptClient, PromptClient};
pub use cycle::{JobEnd, JobEvent, JobId, JobUpdate, RequestCycle, SubmitMode};
pub use encode::{AMPERSAND_SENTINEL, PLUS_SENTINEL, PromptMode, PromptRequest, escape_code};
pub use poll::{
    END_SENTINEL, PollEvent, PollOutcome, PollPolicy, PollSettings, PollVerdict, judge_poll,
    run_poll_loop,
};

#[cfg(test)]
pub(crate) use client::scripted::ScriptedClient;

/// Placeholder shown in the output pane while a job is running.
pub const GENERATING_PLACEHOLDER: &str = "Generating...";

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid endpoint {0}")]
    InvalidEndpoint(String),
}

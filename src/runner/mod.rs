//! Sequential chain execution.
//!
//! The runner builds and executes each mold of a chain in order. Every build
//! after the first sees the response of the step before it. The first
//! failure stops the run; the responses collected so far are returned with
//! the error.

use crate::builder::{BuildError, Dispatcher, RequestBuilder};
use crate::chain::{self, ChainError};
use crate::executor::{HttpClient, RequestError};
use crate::models::{Mold, Response};
use crate::profile::Profile;
use std::fmt;
use std::time::{Duration, Instant};

/// Progress report for one completed step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Position of the step in the chain, starting at 0.
    pub index: usize,
    /// Name of the mold that ran.
    pub name: String,
    /// Time spent building and executing the step.
    pub duration: Duration,
    /// Status code of the response.
    pub status_code: u16,
    /// Where the request asked its response body to be saved.
    pub output: Option<String>,
}

/// Why a step failed.
#[derive(Debug)]
pub enum StepError {
    Build(BuildError),
    Request(RequestError),
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepError::Build(err) => write!(f, "{}", err),
            StepError::Request(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for StepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StepError::Build(err) => Some(err),
            StepError::Request(err) => Some(err),
        }
    }
}

/// Errors returned by [`Runner::run`].
#[derive(Debug)]
pub enum RunnerError {
    /// There was nothing to run.
    EmptyChain,

    /// The chain could not be resolved.
    Chain(ChainError),

    /// A step failed. `responses` holds the responses of the steps before it.
    Aborted {
        step: usize,
        name: String,
        source: StepError,
        responses: Vec<Response>,
    },
}

impl RunnerError {
    /// Responses collected before the failure, if any.
    pub fn responses(&self) -> &[Response] {
        match self {
            RunnerError::Aborted { responses, .. } => responses,
            _ => &[],
        }
    }
}

impl fmt::Display for RunnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunnerError::EmptyChain => write!(f, "Nothing to run: the chain is empty"),
            RunnerError::Chain(err) => write!(f, "{}", err),
            RunnerError::Aborted {
                step, name, source, ..
            } => write!(f, "Step {} ('{}') failed: {}", step + 1, name, source),
        }
    }
}

impl std::error::Error for RunnerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunnerError::EmptyChain => None,
            RunnerError::Chain(err) => Some(err),
            RunnerError::Aborted { source, .. } => Some(source),
        }
    }
}

impl From<ChainError> for RunnerError {
    fn from(err: ChainError) -> Self {
        RunnerError::Chain(err)
    }
}

/// Runs chains with a builder and an HTTP client.
pub struct Runner<C, B = Dispatcher> {
    builder: B,
    client: C,
}

impl<C: HttpClient> Runner<C> {
    /// Creates a runner that builds with the default [`Dispatcher`].
    pub fn new(client: C) -> Self {
        Self::with_builder(Dispatcher, client)
    }
}

impl<C: HttpClient, B: RequestBuilder> Runner<C, B> {
    /// Creates a runner with a custom builder.
    pub fn with_builder(builder: B, client: C) -> Self {
        Self { builder, client }
    }

    /// Runs `chain` in order and returns every response.
    ///
    /// `on_step` is called after each successful step. A `None` profile is
    /// the same as an empty one.
    pub fn run<F>(
        &self,
        chain: &[Mold],
        profile: Option<&Profile>,
        mut on_step: F,
    ) -> Result<Vec<Response>, RunnerError>
    where
        F: FnMut(&StepReport),
    {
        if chain.is_empty() {
            return Err(RunnerError::EmptyChain);
        }

        let empty = Profile::default();
        let profile = profile.unwrap_or(&empty);
        let mut responses: Vec<Response> = Vec::with_capacity(chain.len());

        for (index, mold) in chain.iter().enumerate() {
            let started = Instant::now();
            log::debug!("step {}/{}: '{}'", index + 1, chain.len(), mold.name);

            let outcome = self
                .builder
                .build(mold, profile, responses.last())
                .map_err(StepError::Build)
                .and_then(|request| {
                    self.client
                        .execute(&request)
                        .map(|response| (request.output, response))
                        .map_err(StepError::Request)
                });

            match outcome {
                Ok((output, response)) => {
                    on_step(&StepReport {
                        index,
                        name: mold.name.clone(),
                        duration: started.elapsed(),
                        status_code: response.status_code,
                        output,
                    });
                    responses.push(response);
                }
                Err(source) => {
                    log::debug!("step '{}' failed: {}", mold.name, source);
                    return Err(RunnerError::Aborted {
                        step: index,
                        name: mold.name.clone(),
                        source,
                        responses,
                    });
                }
            }
        }

        Ok(responses)
    }

    /// Resolves the chain ending at `target` within `all`, then runs it.
    pub fn run_target<F>(
        &self,
        target: &Mold,
        all: &[Mold],
        profile: Option<&Profile>,
        on_step: F,
    ) -> Result<Vec<Response>, RunnerError>
    where
        F: FnMut(&StepReport),
    {
        let chain = chain::resolve(target, all)?;
        self.run(&chain, profile, on_step)
    }
}

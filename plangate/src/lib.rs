//! Plangate: a prompt gateway in front of OpenAI, Anthropic and Gemini.
//!
//! A request names a provider and a task type. The [`dispatch::Dispatcher`]
//! adds the task's system instruction, calls the provider adapter with a key
//! from the shared [`credentials::CredentialCache`], and turns the reply into
//! a [`normalize::NormalizedResult`].

pub mod api;
pub mod audit;
pub mod config;
pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod llm;
pub mod normalize;

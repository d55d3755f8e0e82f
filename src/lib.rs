//! Configuration resolution and prompt rendering for LLM agents
//!
//! Settings, a model library, personas and per-agent definitions are
//! merged into one [`agent::config::AgentConfig`] per invocation:
//!
//! - [`settings`] loads the settings directory into immutable snapshots
//! - [`resolve`] applies the model override chain
//! - [`context`] builds the render variables
//! - [`template`] compiles and renders prompt templates
//! - [`validate`] rejects empty roles
//! - [`agent`] runs the pipeline around an external model call

pub mod agent;
pub mod context;
pub mod error;
pub mod persona;
pub mod resolve;
pub mod response;
pub mod settings;
pub mod template;
pub mod validate;
pub mod workspace;

pub use agent::config::{AgentConfig, AgentConfigLoader, RuntimeOverrides};
pub use agent::{Agent, AgentHooks, AgentOutput, DefaultHooks, EchoGenerator, Generator};
pub use context::{RenderContext, Vars};
pub use error::{Error, ReferenceKind, Result};
pub use template::PromptTemplate;
pub use template::render::{RenderedPrompt, render};
pub use workspace::Workspace;

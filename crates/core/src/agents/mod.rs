//! # Agents
//!
//! Role-specialised generation agents and the language-model seam they run on.

pub mod generation_agent;
pub mod language_model;
pub mod llm_helpers;
pub mod profiles;

pub use generation_agent::{clean_answer, GenerationAgent};
pub use language_model::{AgentStep, LanguageModel, RadkitModel};
pub use profiles::{AgentProfile, AgentRole};

//! Skill-gap analysis engine library

pub mod analysis;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod extraction;
pub mod matching;
pub mod ontology;
pub mod output;
pub mod schema;

pub use config::EngineConfig;
pub use engine::{AnalysisRequest, GapEngine};
pub use error::{Result, SkillGapError};

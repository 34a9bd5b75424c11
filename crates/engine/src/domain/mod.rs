pub mod builder;
pub mod collaborators;
pub mod configuration;
pub mod error;
pub mod global;
pub mod hostname;
pub mod parser;
pub mod report;
pub mod types;
pub mod validation;

pub mod llm;
pub mod rules;

pub use llm::ExternalTriage;
pub use rules::RuleEngine;

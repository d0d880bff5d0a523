pub mod audit;
pub mod llm;
pub mod ollama;
pub mod pipeline;
pub mod prompts;

pub mod engine;
pub mod frontend;
pub mod protocol;
pub mod apply_delta;
pub mod routing;
pub mod modality;

pub mod prompt_builder;
pub mod llm_client;
pub mod response_parser;

pub mod analyzer;
pub mod model_client;
pub mod mood_log;

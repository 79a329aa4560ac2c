mod openai_analyzer;

pub use openai_analyzer::{compute_talk_ratios, parse_analysis_payload, OpenAiAnalyzer};

mod deepgram_engine;

pub use deepgram_engine::DeepgramTranscriber;

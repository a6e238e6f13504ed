pub mod period_reader;
pub mod ring_buffer;
pub mod wav_format;

pub mod metadata;
pub mod output_sink;
pub mod raw_writer;
pub mod stream_writer;
pub mod wav_writer;

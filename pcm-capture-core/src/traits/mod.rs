pub mod capture_observer;
pub mod pcm_device;
pub mod sink_destination;

#[cfg(test)]
pub(crate) mod mocks;

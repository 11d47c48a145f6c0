pub mod capability;
pub mod cycle;
pub mod frame;
pub mod geometry;
pub mod log_sink;
pub mod session;

#[cfg(test)]
pub(crate) mod fakes;

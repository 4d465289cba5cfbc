//! Núcleo do kernel: boot, logs e tempo.

pub mod entry;
pub mod logging;
pub mod time;

#[cfg(feature = "self_test")]
pub mod test;

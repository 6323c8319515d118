//! Live iris-color overlay for webcam video, with a timed, branded still
//! capture.

pub mod capture;
pub mod catalog;
pub mod console;
pub mod landmarks;
pub mod output;
pub mod overlay;
pub mod pipeline;
pub mod snapshot;

pub mod detector_config;
pub mod progress_bars;

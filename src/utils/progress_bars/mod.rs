pub mod logging;
pub mod progress_callback;

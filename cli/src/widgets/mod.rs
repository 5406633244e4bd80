pub mod progress;
pub mod util;

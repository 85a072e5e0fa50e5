pub mod locator;
pub mod tailer;

pub use locator::FileLocator;
pub use tailer::{Tailer, TailerOptions};

pub mod headless;
pub mod watch;

pub use headless::{HeadlessMode, HeadlessSummary};
pub use watch::WatchMode;

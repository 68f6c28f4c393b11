pub mod comment;
pub mod locator;
pub mod targets;

pub use comment::{Comment, HarvestState, Label};
pub use locator::{Locator, LocatorScheme};
pub use targets::{load_url_file, Target};

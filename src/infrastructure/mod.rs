//! 基础设施层
//!
//! 持有稀缺资源（Page），只暴露能力

pub mod chrome_session;
pub mod retry;
pub mod session;

pub use chrome_session::ChromeSession;
pub use retry::BoundedRetry;
pub use session::{AutomationSession, Cookie};

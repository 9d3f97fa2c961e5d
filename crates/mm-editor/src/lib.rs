pub mod grouping;
pub mod session;

pub use grouping::{GroupingConfig, GroupingCycle, GroupingError, GroupingState, Notice, NoticeKind};
pub use session::BoardSession;

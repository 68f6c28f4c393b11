pub mod harvest;
pub mod moderation;

pub use harvest::{
    Advance, CollectOnly, CommentSink, HarvestOptions, HarvestOutcome, HarvestPhase,
    HarvestSession, TerminationReason,
};
pub use moderation::{ModerationExecutor, ModerationOutcome};

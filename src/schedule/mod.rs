//! Schedule documents: loading, rewriting and the collaborator output format

pub mod export;
pub mod model;

pub use export::{ChannelSchedule, ExportOutcome, ScheduleEntry, slugify, write_channel_schedule};
pub use model::{LogoReference, ScheduleDay, ScheduleFile, slug_from_path};

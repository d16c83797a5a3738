// Timeline synchronization and audio assembly
//
// - Track: fixed-length composite buffer clips are mixed into
// - Scheduler: per-segment synthesis, slot fitting, and placement

pub mod scheduler;
pub mod track;

pub use scheduler::*;
pub use track::*;

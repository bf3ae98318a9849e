pub mod boundary;
pub mod calendar;
pub mod conflict;
pub mod formatter;
pub mod generator;
pub mod schedule;
pub mod status;
pub mod store;

pub use boundary::{NewSlotRow, SlotBoundary, SupabaseSlotBoundary};
pub use calendar::{CalendarProjection, CalendarView};
pub use conflict::{ConflictDetector, SlotCandidate};
pub use formatter::RecordFormatter;
pub use generator::{BatchPlan, BulkScheduleGenerator};
pub use schedule::ScheduleService;
pub use status::StatusTranslator;
pub use store::{SlotStore, StoreSnapshot};

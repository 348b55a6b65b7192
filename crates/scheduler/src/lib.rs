pub mod scheduler;
pub mod trigger;

pub use scheduler::DailyScheduler;
pub use trigger::{report_generation, spawn_generation};

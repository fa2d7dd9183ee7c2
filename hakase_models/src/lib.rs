pub mod assignment;
pub mod course;
pub mod settings;

pub use chrono;
pub use chrono_tz;

pub mod calendar_dir;
pub mod excel_read;
pub mod ics;
pub mod json;

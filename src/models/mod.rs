pub mod announcement;
pub mod notification;
pub mod report;
pub mod user;

pub mod analytics;
pub mod grading;
pub mod question;
pub mod session;
pub mod template;

pub mod analytics_dto;
pub mod session_dto;

pub mod messages_route;
pub mod session_dto;
pub mod session_route;

//! Business logic services layer

pub mod auth_service;
pub mod course_service;

pub use auth_service::CredentialAuthenticator;
pub use course_service::CourseService;

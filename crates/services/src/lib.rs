#![forbid(unsafe_code)]

pub mod app_services;
pub mod board_service;
pub mod category_service;
pub mod error;
pub mod progress_service;
pub mod roster_service;
pub mod set_service;

pub use coach_core::Clock;

pub use app_services::AppServices;
pub use board_service::{BoardRow, BoardService};
pub use category_service::{CategoryService, MoveOutcome};
pub use error::{
    AppServicesError, BoardServiceError, CategoryServiceError, ErrorKind, ProgressServiceError,
    RosterServiceError, SetServiceError,
};
pub use progress_service::ProgressService;
pub use roster_service::RosterService;
pub use set_service::SetService;

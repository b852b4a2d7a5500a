pub mod ai_backend;
pub mod ai_gateway;
pub mod api;
pub mod config;
pub mod database;
pub mod document_service;
pub mod errors;
pub mod logging;
pub mod models;
pub mod plan_service;
pub mod quiz_service;
pub mod response_parser;
pub mod roadmap;
pub mod video_service;

pub use ai_backend::{GeminiBackend, SimulatedBackend, TextBackend};
pub use ai_gateway::AiGateway;
pub use config::Config;
pub use database::Database;
pub use document_service::DocumentService;
pub use errors::*;
pub use models::*;
pub use plan_service::PlanService;
pub use quiz_service::QuizService;
pub use video_service::VideoService;

pub mod chart_service;
pub mod chat_controller;
pub mod number_format;

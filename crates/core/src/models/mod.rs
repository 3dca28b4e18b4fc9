pub mod chart;
pub mod chat;
pub mod company;
pub mod locale;
pub mod settings;

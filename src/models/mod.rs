pub mod analytics;
pub mod feedback;
pub mod settings;

pub mod aggregator;
pub mod analytics_engine;
pub mod feedback_filter;
pub mod heatmap_builder;
pub mod keyword_extractor;
pub mod report_service;
pub mod settings_service;
pub mod time_bucketer;
pub mod trend_builder;

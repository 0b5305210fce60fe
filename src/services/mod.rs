pub mod activity_editor;
pub mod ai_service;
pub mod day_timing;
pub mod drag_gesture;
pub mod itinerary_gateway;
pub mod option_parser;
pub mod prompt_templates;
pub mod time_utils;
pub mod trip_store;

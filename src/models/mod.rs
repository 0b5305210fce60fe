pub mod itinerary;
pub mod search;
pub mod trip;

pub mod availability_service;
pub mod booking_service;
pub mod change_feed;
pub mod pricing_service;
pub mod scheduling_service;
pub mod week_selection;

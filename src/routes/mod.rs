pub mod accommodation;
pub mod admin;
pub mod application;
pub mod auth;
pub mod bookings;
pub mod credits;
pub mod health;
pub mod scheduling;

pub mod accommodation;
pub mod account;
pub mod application;
pub mod bookings;
pub mod scheduling;

pub mod availability;
pub mod conflict;
pub mod registration;
pub mod rooms;
pub mod schedule;
pub mod scheduling;

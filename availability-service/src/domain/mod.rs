pub mod block;
pub mod booking;
pub mod calendar;
pub mod conflict;
pub mod ical;
pub mod interval;
pub mod recurrence;
pub mod recurring;
pub mod service;

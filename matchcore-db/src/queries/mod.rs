pub mod events;
pub mod matches;
pub mod rebuild;
pub mod runs;
pub mod staging;
pub mod standings;
pub mod teams;

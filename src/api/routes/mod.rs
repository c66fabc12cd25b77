pub mod attendance;
pub mod columns;
pub mod events;
pub mod overview;
pub mod stats;
pub mod teams;

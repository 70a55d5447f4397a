pub mod balance;
pub mod setup;
pub mod ui;
pub mod watch;

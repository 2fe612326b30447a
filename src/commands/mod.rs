pub mod categories;
pub mod menu;
pub mod orders;
pub mod reports;
pub mod settings;
pub mod tables;
pub mod users;

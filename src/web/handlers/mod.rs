pub mod health;
pub mod hello;
pub mod models;
pub mod relay;
pub mod workstation;

pub mod backup;
pub mod db;
pub mod derive;
pub mod error;
pub mod models;
pub mod seed;
pub mod service;
pub mod settings;
pub mod state;

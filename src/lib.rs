pub mod api;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod dune;
pub mod models;
pub mod poller;
pub mod transform;

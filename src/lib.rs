pub mod config;
pub mod controller;
pub mod logging;
pub mod mfapi;
pub mod presentation;

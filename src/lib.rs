//! Local chat client for Gemini: conversation state, persistence and the
//! completion round trip, served to a browser front end as JSON.

pub mod agent;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod routes;
pub mod service;

// commerce_server/src/lib.rs

//! Storefront backend: product, order and chat-session CRUD over Postgres,
//! a streaming commerce assistant, and the frontend edge relay.

pub mod agent;
pub mod config;
pub mod db;
pub mod errors;
pub mod graphs;
pub mod llm;
pub mod models;
pub mod relay;
pub mod state;
pub mod telemetry;
pub mod web;

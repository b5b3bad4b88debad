//! Core hangar client library (session, request pipeline, feed, views).

pub mod api;
pub mod config;
pub mod feed;
pub mod filter;
pub mod guard;
pub mod logging;
pub mod models;
pub mod session;
pub mod views;

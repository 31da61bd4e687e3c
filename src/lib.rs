pub mod app_config;
pub mod auth;
pub mod backend;
pub mod content;
pub mod db;
pub mod flags;
pub mod form;
pub mod ip;
pub mod listing;
pub mod orm;
pub mod profanity;
pub mod schema;
pub mod security;
pub mod signals;
pub mod signing;
pub mod web;

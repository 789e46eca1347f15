pub mod catalog;
pub mod category;
pub mod checklist;
pub mod cooking_list;
pub mod db;
pub mod error;
pub mod history;
pub mod models;
pub mod quantity;
pub mod service;
pub mod shopping;
pub mod store;

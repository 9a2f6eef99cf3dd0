//! Application services layer.

pub mod admin;
pub mod content;
pub mod error;
pub mod options;
pub mod permalinks;
pub mod render;
pub mod repos;
pub mod thumbnails;
pub mod widget;

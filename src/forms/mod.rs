//! Form payloads and their validation rules.
pub mod image;
pub mod main;
pub mod rules;

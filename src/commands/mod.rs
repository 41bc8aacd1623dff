//! Tauri commands exposing the capture controller
//!
//! The command surface mirrors the controller's capability set; the UI layer
//! binds these to buttons and rotation events.

pub mod control;
pub mod permissions;

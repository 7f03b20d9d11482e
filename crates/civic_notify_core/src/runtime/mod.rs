//! Async driver for the notification surface.

pub mod notification_center;

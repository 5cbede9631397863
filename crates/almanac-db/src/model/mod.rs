pub mod event;
pub mod exception;
pub mod notification;
pub mod series;

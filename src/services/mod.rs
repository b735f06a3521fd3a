pub mod api;
pub mod event_bus;
pub mod profile;
pub mod session;
pub mod storage;

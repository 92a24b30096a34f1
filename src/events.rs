pub mod app_event;

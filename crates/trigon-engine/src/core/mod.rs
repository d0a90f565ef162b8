//! Contract between the window runtime and the application it hosts.

mod app;

pub use app::App;

pub mod controller;
pub(crate) mod flight;
pub mod notify;
pub mod render_loop;

//! Host wiring: builds every service at startup and tears them down in
//! reverse order on exit.

mod setup;

pub use setup::{setup, Services, SetupError};

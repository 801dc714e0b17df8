pub mod systemd;

pub use systemd::Systemd;

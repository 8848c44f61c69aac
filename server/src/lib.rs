pub mod api;
pub mod config;
pub mod crm;
pub mod services {
    pub mod donation;
}
pub mod ui;
pub mod wire;

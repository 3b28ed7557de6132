//! Admin settings API outbound adapter.
//!
//! This module provides a thin HTTP implementation of the
//! `SettingsTransport` port.

mod dto;
mod http_transport;

pub use http_transport::HttpSettingsTransport;

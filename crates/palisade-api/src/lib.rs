// palisade-api: Async Rust client for the PAN-OS / Panorama XML configuration API

pub mod client;
pub mod error;
pub mod scope;
pub mod transport;
pub mod xml;

pub use client::Client;
pub use error::Error;
pub use scope::{Rulebase, Scope};
pub use xml::Element;

//! skiff-cloud: declarative building blocks for a serverless REST API
//!
//! This crate assembles resource declarations and registers them with an
//! external orchestration engine through [`Stack`]. The engine owns
//! dependency resolution, diffing against deployed state, and the actual
//! cloud API calls; this crate only describes what should exist:
//! - `GatewayProps`: REST API gateway with optional custom-domain DNS
//! - `Service`: immutable builder wiring routes, handlers, and OAuth2
//! - `FunctionProps` / `AssetCode`: Lambda handlers whose code assets are
//!   identified by a `skiff-core` fingerprint

mod error;
mod gateway;
mod handler;
mod service;
mod stack;

pub use error::CloudError;
pub use gateway::{EndpointType, GatewayProps, zone_apex};
pub use handler::{AssetCode, FunctionProps};
pub use service::Service;
pub use stack::{Resource, Stack, kind};

/// Result type for resource assembly operations
pub type Result<T> = std::result::Result<T, CloudError>;

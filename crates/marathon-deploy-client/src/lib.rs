//! marathon-deploy client: Marathon descriptor rendering and REST updates
//!
//! This crate is the concrete deployment pipeline behind the trigger in
//! `marathon-deploy-core`. It reads the app descriptor template from the
//! build workspace, applies the step's overrides, resolves build variables
//! and pushes the result to Marathon's `/v2/apps` endpoint.

pub mod client;
pub mod descriptor;
pub mod pipeline;
pub mod template;

pub use client::{
    MarathonClient, MarathonClientConfig, UpdateResponse, DEFAULT_DESCRIPTOR_FILE,
    DEFAULT_RENDERED_FILE,
};
pub use descriptor::AppDescriptor;
pub use pipeline::MarathonPipeline;
pub use template::{replace_macro, resolve_value};

//! PDP provider abstraction

mod flows;
pub mod ports;
mod registry;

pub use flows::{flow_request, search_request, FlowApi};
pub use registry::{ProviderFactory, ProviderRegistry};

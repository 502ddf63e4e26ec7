//! # Plexus Std
//!
//! Ready-made stages built on the interceptor protocol.

pub mod config;
pub mod prelude;
pub mod stages;

pub use config::{ConfigError, ContractOptions, RequestTypes, StagesConfig};
pub use stages::branch::{branch, branch_from};
pub use stages::capture::{capture, capture_with};
pub use stages::contract::{Contract, contract};
pub use stages::delay::delay;
pub use stages::effect::effect;
pub use stages::promote::{
    Promoted, dispatch_promoted, promote, promote_with, resolve_after_dispatch,
    resolve_before_dispatch,
};
pub use stages::request::request;
pub use stages::scope::scope;

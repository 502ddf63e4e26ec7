pub use crate::config::{ContractOptions, RequestTypes, StagesConfig};
pub use crate::stages::branch::{branch, branch_from};
pub use crate::stages::capture::{capture, capture_with};
pub use crate::stages::contract::contract;
pub use crate::stages::delay::delay;
pub use crate::stages::effect::effect;
pub use crate::stages::promote::{Promoted, promote, promote_with};
pub use crate::stages::request::request;
pub use crate::stages::scope::scope;

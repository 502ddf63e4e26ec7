pub mod branch;
pub mod capture;
pub mod contract;
pub mod delay;
pub mod effect;
pub mod promote;
pub mod request;
pub mod scope;

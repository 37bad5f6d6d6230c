pub mod balance;
pub mod contract;
pub mod duration_index;
mod error;
pub mod lockup;
pub mod msg;
pub mod query;
pub mod state;
pub mod synthetic;
pub mod unlock_queue;

pub use crate::error::ContractError;

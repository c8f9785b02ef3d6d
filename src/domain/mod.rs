mod account;
mod balance;
mod customer;
mod transaction;

pub use account::*;
pub use balance::*;
pub use customer::*;
pub use transaction::*;

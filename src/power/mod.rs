pub mod client;
pub mod response;

pub use client::{PowerClient, PowerQuery};
pub use response::{PowerRow, PowerSeries};

mod account;
mod action;
mod block;
mod checksum;
mod contract;
mod name;
mod status;
mod time;

pub use account::Account;
pub use action::{ActionTrace, TransactionStatus};
pub use block::BlockInfo;
pub use checksum::Checksum256;
pub use contract::{ContractIndex64, ContractIndex64Row, ContractRow};
pub use name::{InvalidName, Name};
pub use status::DatabaseStatus;
pub use time::{BlockTimestamp, TimePoint};

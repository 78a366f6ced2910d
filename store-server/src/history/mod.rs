//! 撤销/重做引擎
//!
//! 可撤销的表：laptops、customers、repairs。销售（有库存副作用）、
//! 分期、注册申请、用户、备份不经过命令历史。

pub mod command;
pub mod manager;

pub use command::{
    AddCommand, AddCustomer, AddLaptop, AddRepair, Command, DeleteCommand, DeleteCustomer,
    DeleteLaptop, DeleteRepair, UpdateCommand, UpdateCustomer, UpdateLaptop, UpdateRepair,
};
pub use manager::{CommandHistory, DEFAULT_HISTORY_LIMIT};

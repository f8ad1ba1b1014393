pub mod allocation;
pub mod export;
pub mod intake;
pub mod storage;

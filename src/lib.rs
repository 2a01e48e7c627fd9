pub mod api;
pub mod camlink;
pub mod flash;
pub mod operation;
pub mod transport;

#[cfg(test)]
mod testutil;

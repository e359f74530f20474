pub mod app;
pub mod askpass;
pub mod config;
pub mod metrics;
pub mod rpc;

#[cfg(test)]
mod tests;

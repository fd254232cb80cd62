pub mod api;
pub mod context;

pub mod domain_model;
pub mod domain_port;
pub mod infra_memory;
pub mod infra_mongo;
pub mod infra_mysql;
pub mod infra_redis;

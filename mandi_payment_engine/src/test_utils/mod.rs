mod prepare_env;

pub use prepare_env::prepare_memory_db;

pub(crate) mod memory_user_repository;
pub(crate) mod user_repository;

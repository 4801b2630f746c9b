pub(crate) mod api_handler;
pub(crate) mod auth_handler;
pub(crate) mod health_handler;
pub(crate) mod profile_handler;
pub(crate) mod refresh_handler;
pub(crate) mod register_handler;

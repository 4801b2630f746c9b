pub(crate) mod auth_state;
pub(crate) mod token_state;

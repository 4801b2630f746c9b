pub(crate) mod token_dto;
pub(crate) mod user_dto;

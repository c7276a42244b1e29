pub mod get_client_ip;
pub mod valid_uuid;
pub mod youtube;

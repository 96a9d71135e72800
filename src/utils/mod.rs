pub mod base64url;
pub(crate) mod registry;

pub use base64url::{decode, decode_bytes, encode, encode_bytes};

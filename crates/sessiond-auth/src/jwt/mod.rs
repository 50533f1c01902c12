//! JWT token encoding, decoding, and claims.

pub mod claims;
pub mod codec;
pub mod decoder;
pub mod encoder;

pub use claims::Claims;
pub use codec::JwtCodec;
pub use decoder::JwtDecoder;
pub use encoder::JwtEncoder;

//! Codec Module
//!
//! Stateless transforms between typed values and bytes. A codec is generic
//! over the value type so a format can restrict the family of values it
//! accepts at compile time.

mod bincode;
mod json;
mod protobuf;

pub use self::bincode::BincodeCodec;
pub use self::json::JsonCodec;
pub use self::protobuf::ProtobufCodec;

use crate::error::CodecError;

// == Codec Trait ==
/// Serializer/deserializer for values of type `T`.
///
/// `decode(encode(v))` must reconstruct a value equal to `v`. Failures are
/// reported as [`CodecError`], never as panics.
pub trait Codec<T>: Send + Sync {
    /// Short format name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Appends the encoded form of `value` to `buf`.
    fn encode(&self, value: &T, buf: &mut Vec<u8>) -> Result<(), CodecError>;

    /// Decodes a complete payload.
    fn decode(&self, data: &[u8]) -> Result<T, CodecError>;
}

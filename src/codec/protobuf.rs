//! Protocol buffer codec backed by prost.
//!
//! Only `prost::Message` types implement `Codec<T>` for this format, so
//! non-message values are rejected by the compiler rather than at runtime.

use prost::Message;

use crate::codec::Codec;
use crate::error::CodecError;

/// Encodes prost messages in the protobuf wire format.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtobufCodec;

impl<T> Codec<T> for ProtobufCodec
where
    T: Message + Default,
{
    fn name(&self) -> &'static str {
        "protobuf"
    }

    fn encode(&self, value: &T, buf: &mut Vec<u8>) -> Result<(), CodecError> {
        buf.reserve(value.encoded_len());
        value
            .encode(buf)
            .map_err(|err| CodecError::encode("protobuf", err))
    }

    fn decode(&self, data: &[u8]) -> Result<T, CodecError> {
        T::decode(data).map_err(|err| CodecError::decode("protobuf", err))
    }
}

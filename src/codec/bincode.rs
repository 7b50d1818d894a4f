//! Compact binary codec backed by bincode's serde integration.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::Codec;
use crate::error::CodecError;

/// Encodes values with bincode's standard configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl<T> Codec<T> for BincodeCodec
where
    T: Serialize + DeserializeOwned,
{
    fn name(&self) -> &'static str {
        "bincode"
    }

    fn encode(&self, value: &T, buf: &mut Vec<u8>) -> Result<(), CodecError> {
        ::bincode::serde::encode_into_std_write(value, buf, ::bincode::config::standard())
            .map(|_| ())
            .map_err(|err| CodecError::encode("bincode", err))
    }

    fn decode(&self, data: &[u8]) -> Result<T, CodecError> {
        let (value, read) =
            ::bincode::serde::decode_from_slice(data, ::bincode::config::standard())
                .map_err(|err| CodecError::decode("bincode", err))?;

        if read != data.len() {
            return Err(CodecError::decode(
                "bincode",
                format!("{} trailing bytes after value", data.len() - read),
            ));
        }
        Ok(value)
    }
}

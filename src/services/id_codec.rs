/*
 * Responsibility
 * - blogs.id (BIGSERIAL) を推測されにくい公開 ID に変換
 * - 公開 ID からの逆引きはしない (記事は slug で引く)
 */
use sqids::Sqids;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdCodecError {
    #[error("SQIDS_MIN_LENGTH must fit in 0..=255, got {0}")]
    MinLength(usize),
    #[error("invalid sqids configuration: {0}")]
    Config(#[source] sqids::Error),
    #[error("cannot encode id {0}")]
    Encode(i64, #[source] sqids::Error),
    #[error("ids are never negative, got {0}")]
    Negative(i64),
}

#[derive(Clone, Debug)]
pub struct IdCodec {
    sqids: Sqids,
}

impl IdCodec {
    pub fn new(min_length: usize, alphabet: &str) -> Result<Self, IdCodecError> {
        let min_length = u8::try_from(min_length).map_err(|_| IdCodecError::MinLength(min_length))?;

        let sqids = Sqids::builder()
            .min_length(min_length)
            .alphabet(alphabet.chars().collect())
            .build()
            .map_err(IdCodecError::Config)?;

        Ok(Self { sqids })
    }

    pub fn encode(&self, id: i64) -> Result<String, IdCodecError> {
        let n = u64::try_from(id).map_err(|_| IdCodecError::Negative(id))?;
        self.sqids
            .encode(&[n])
            .map_err(|e| IdCodecError::Encode(id, e))
    }
}

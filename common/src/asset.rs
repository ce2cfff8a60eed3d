use std::{
    fs,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("asset file access failed")]
    Io(#[from] std::io::Error),
    #[error("failed to encode asset")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("failed to decode asset")]
    Decode(#[from] bincode::error::DecodeError),
}

/// Types written to and read from disk as a single bincode blob.
pub trait Asset: Sized + bincode::Encode + bincode::Decode {
    fn save(&self, path: impl AsRef<Path>) -> Result<(), AssetError> {
        let mut writer = BufWriter::new(fs::File::create(path)?);

        bincode::encode_into_std_write(self, &mut writer, bincode::config::standard())?;
        writer.flush()?;

        Ok(())
    }

    fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let mut reader = BufReader::new(fs::File::open(path)?);

        Ok(bincode::decode_from_std_read(
            &mut reader,
            bincode::config::standard(),
        )?)
    }
}

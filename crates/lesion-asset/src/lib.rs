/*!
Model assets for lesion.

A bundled model is a single file holding the network (ONNX or NNEF)
and the [`ModelSpec`] describing how to feed it and read its output.
Keeping both in one file means the pipeline is always configured for
the exact weights it runs.

The layout is:

```text
"LSNA" | version: u8 | kind: u8 | 0u8 | 0u8 | metadata length: u32 LE | metadata (JSON) | model bytes
```

[`Materializer`] takes care of getting the bundled file into writable
local storage before it's loaded.
*/

#![warn(rust_2018_idioms)]

mod error;
mod materialize;

pub use error::AssetError;
pub use materialize::{AssetSource, DirSource, Materializer, MemorySource, RefreshPolicy};

use lesion_core::prelude::{Classifier, Inferer, ModelSpec, TractInferer};
use std::{
    fs::File,
    io::{Cursor, Read, Write},
    path::Path,
};

pub const VERSION: u8 = 1;

/// Magic used to ensure assets are valid.
pub const MAGIC: [u8; 4] = [b'L', b'S', b'N', b'A'];

/// Metadata larger than this is treated as corruption.
pub const MAX_METADATA_LEN: u32 = 1 << 20;

/// AssetKind denotes what kind of network is contained inside an [`AssetData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AssetKind {
    /// Used for an asset containing ONNX ModelProto data.
    Onnx = 1,

    /// Used for an asset containing NNEF data.
    Nnef = 2,
}

impl TryFrom<u8> for AssetKind {
    type Error = AssetError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(AssetKind::Onnx),
            2 => Ok(AssetKind::Nnef),
            v => Err(AssetError::Format(format!("unexpected asset kind: {:?}", v))),
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetKind::Onnx => f.pad("onnx"),
            AssetKind::Nnef => f.pad("nnef"),
        }
    }
}

fn read_array<const N: usize>(reader: &mut impl Read, what: &str) -> Result<[u8; N], AssetError> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => AssetError::Format(format!(
            "too few bytes available, expected {} for the {}",
            N, what
        )),
        _ => AssetError::Io(e),
    })?;

    Ok(buf)
}

/// A network and the spec it was trained for.
#[derive(Debug, Clone)]
pub struct AssetData {
    kind: AssetKind,
    spec: ModelSpec,
    data: Vec<u8>,
}

impl AssetData {
    /// Create a new AssetData from parts.
    ///
    /// Note: Does not validate the network data.
    pub fn new<Data: Into<Vec<u8>>>(kind: AssetKind, spec: ModelSpec, data: Data) -> Self {
        Self {
            kind,
            spec,
            data: data.into(),
        }
    }

    /// Deserialize from raw bytes.
    ///
    /// Note: Only the header and metadata are validated; the network is
    /// checked when creating a classifier.
    pub fn deserialize(mut reader: impl Read) -> Result<Self, AssetError> {
        let magic: [u8; 4] = read_array(&mut reader, "magic")?;
        if magic != MAGIC {
            return Err(AssetError::Format(format!(
                "unexpected magic: expected 'LSNA' found {}",
                String::from_utf8_lossy(&magic)
            )));
        }

        let preamble: [u8; 4] = read_array(&mut reader, "preamble")?;
        let version = preamble[0];
        if version != VERSION {
            return Err(AssetError::Format(format!(
                "unsupported asset version {}",
                version
            )));
        }

        if preamble[2] != 0 || preamble[3] != 0 {
            return Err(AssetError::Format(format!(
                "unexpected non-zero bytes in bytes 3 and 4 of preamble: {}{}",
                preamble[2], preamble[3]
            )));
        }

        let kind = preamble[1].try_into()?;

        let metadata_len = u32::from_le_bytes(read_array(&mut reader, "metadata length")?);
        if metadata_len > MAX_METADATA_LEN {
            return Err(AssetError::Format(format!(
                "metadata length {} exceeds the limit of {}",
                metadata_len, MAX_METADATA_LEN
            )));
        }

        let mut metadata = vec![0u8; metadata_len as usize];
        reader.read_exact(&mut metadata).map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => {
                AssetError::Format("metadata is truncated".to_owned())
            }
            _ => AssetError::Io(e),
        })?;

        let spec: ModelSpec = serde_json::from_slice(&metadata)?;

        let mut data = vec![];
        reader.read_to_end(&mut data)?;

        Ok(Self { kind, spec, data })
    }

    /// Read and deserialize the asset stored at `path`.
    pub fn load(path: &Path) -> Result<Self, AssetError> {
        let file = File::open(path)?;
        Self::deserialize(std::io::BufReader::new(file))
    }

    /// Serialize to raw bytes.
    ///
    /// The buffer returned will not contain any extra unused bytes.
    pub fn serialize(&self) -> Result<Vec<u8>, AssetError> {
        let metadata = serde_json::to_vec(&self.spec)?;
        let metadata_len = u32::try_from(metadata.len())
            .ok()
            .filter(|len| *len <= MAX_METADATA_LEN)
            .ok_or_else(|| AssetError::Format("metadata too large".to_owned()))?;

        let mut output = Vec::with_capacity(12 + metadata.len() + self.data.len());
        output.write_all(&MAGIC)?;
        output.write_all(&[VERSION, self.kind as u8, 0, 0])?;
        output.write_all(&metadata_len.to_le_bytes())?;
        output.write_all(&metadata)?;
        output.write_all(&self.data)?;

        Ok(output)
    }

    /// Get the kind of this asset.
    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    /// Get the declared model spec.
    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    /// Get the network data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Load the network as declared by the network itself, ignoring the spec.
    pub fn load_basic(&self) -> Result<TractInferer, AssetError> {
        let mut cursor = Cursor::new(&self.data);
        match self.kind {
            AssetKind::Onnx => lesion_onnx::builder(&mut cursor).build_basic(),
            AssetKind::Nnef => lesion_nnef::builder(&mut cursor).build_basic(),
        }
        .map_err(AssetError::Model)
    }

    /// Load a ready-to-use classifier, with the network input pinned to what the spec declares.
    pub fn load_classifier(&self) -> Result<Classifier, AssetError> {
        self.spec.validate()?;

        let mut cursor = Cursor::new(&self.data);
        let inferer = match self.kind {
            AssetKind::Onnx => lesion_onnx::builder(&mut cursor).build_for_spec(&self.spec),
            AssetKind::Nnef => lesion_nnef::builder(&mut cursor).build_for_spec(&self.spec),
        }
        .map_err(AssetError::Model)?;

        log::debug!(
            "loaded {} model {:?} with inputs {:?}",
            self.kind,
            self.spec.name,
            inferer.input_shapes()
        );

        Ok(Classifier::new(self.spec.clone(), inferer)?)
    }
}

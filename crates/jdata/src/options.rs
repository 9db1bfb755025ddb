use schemars::{JsonSchema, JsonSchema_repr};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::NumberFormat;

#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr, JsonSchema_repr,
)]
#[repr(u8)]
/// JData format version, which selects the element order of flattened dense
/// payloads.
pub enum FormatVersion {
    /// Version 1 flattens arrays in column-major order
    Legacy = 1,
    /// Version 2 reverses the axes of the column-major view before
    /// flattening, i.e. flattens arrays in row-major order
    #[default]
    Current = 2,
}

impl FormatVersion {
    #[must_use]
    /// Returns whether dense payloads are flattened in column-major order.
    pub const fn is_column_major(self) -> bool {
        matches!(self, Self::Legacy)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
/// Configuration of the array annotation encoder.
pub struct EncodeOptions {
    /// Name of the compression codec that is applied to large dense payloads.
    ///
    /// `None`, an empty name, or `"none"` disable compression.
    #[serde(default)]
    pub compression: Option<String>,
    /// Compression is only attempted for arrays with more elements.
    #[serde(default = "default_compress_array_size")]
    pub compress_array_size: usize,
    /// Format version, which selects the element order of dense payloads.
    #[serde(default)]
    pub format_version: FormatVersion,
    /// Write arrays with more than two dimensions as nested JSON arrays
    /// instead of annotating them.
    #[serde(default)]
    pub nested_array: bool,
    /// Always annotate arrays, even if they could be written as plain JSON
    /// arrays.
    #[serde(default)]
    pub array_to_struct: bool,
    /// Write logical values as `true`/`false` instead of `1`/`0`.
    #[serde(default)]
    pub parse_logical: bool,
    /// Round floating point values to this many significant digits.
    ///
    /// `None` writes the shortest representation that reads back exactly.
    #[serde(default)]
    pub float_digits: Option<u8>,
    /// JSON string written in place of NaN.
    #[serde(default = "default_nan_token")]
    pub nan_token: String,
    /// JSON string written in place of positive infinity. Negative infinity
    /// is written with an additional `-` prefix.
    #[serde(default = "default_inf_token")]
    pub inf_token: String,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            compression: None,
            compress_array_size: default_compress_array_size(),
            format_version: FormatVersion::default(),
            nested_array: false,
            array_to_struct: false,
            parse_logical: false,
            float_digits: None,
            nan_token: default_nan_token(),
            inf_token: default_inf_token(),
        }
    }
}

impl EncodeOptions {
    #[must_use]
    /// Returns the requested compression codec name, if compression is
    /// enabled.
    pub fn compression(&self) -> Option<&str> {
        self.compression
            .as_deref()
            .filter(|name| !name.is_empty() && !name.eq_ignore_ascii_case("none"))
    }

    #[must_use]
    /// Returns the rules for rendering individual numbers.
    pub fn number_format(&self) -> NumberFormat<'_> {
        NumberFormat {
            parse_logical: self.parse_logical,
            float_digits: self.float_digits,
            nan_token: &self.nan_token,
            inf_token: &self.inf_token,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
/// Configuration of the array annotation decoder.
pub struct DecodeOptions {
    /// Compressed payloads given as JSON strings are base64-encoded.
    #[serde(default = "default_true")]
    pub base64: bool,
    /// Decode annotated arrays nested anywhere inside the document, not only
    /// at its root.
    #[serde(default = "default_true")]
    pub recursive: bool,
    /// Format version, which selects the element order of dense payloads
    /// that do not declare an `_ArrayOrder_`.
    #[serde(default)]
    pub format_version: FormatVersion,
    /// JSON string that is read as NaN.
    #[serde(default = "default_nan_token")]
    pub nan_token: String,
    /// JSON string that is read as positive infinity, and with an additional
    /// `-` prefix as negative infinity.
    #[serde(default = "default_inf_token")]
    pub inf_token: String,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            base64: true,
            recursive: true,
            format_version: FormatVersion::default(),
            nan_token: default_nan_token(),
            inf_token: default_inf_token(),
        }
    }
}

impl DecodeOptions {
    #[must_use]
    /// Returns the rules for parsing individual numbers.
    pub fn number_format(&self) -> NumberFormat<'_> {
        NumberFormat {
            parse_logical: false,
            float_digits: None,
            nan_token: &self.nan_token,
            inf_token: &self.inf_token,
        }
    }
}

const fn default_compress_array_size() -> usize {
    100
}

const fn default_true() -> bool {
    true
}

fn default_nan_token() -> String {
    String::from("_NaN_")
}

fn default_inf_token() -> String {
    String::from("_Inf_")
}

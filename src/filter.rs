//! Key-index lookup over a streaming map.

use crate::codec::TokenRead;
use crate::decode::{Document, MapReader};
use crate::error::{Error, MisuseCode, Result};

/// Adapter giving random-by-key-index access over a [`MapReader`] under a
/// monotone scan.
///
/// Construction takes a sorted table of `u64` key names; lookups address
/// values by the *index* of a key in that table. The underlying map is read
/// once, so a lookup costs amortized O(bytes scanned) across a
/// non-decreasing sequence of indices. The adapter never rewinds: once the
/// scan has moved past index `i`, looking `i` up again returns `Ok(None)`.
pub struct FilteredMapReader<'a, 'k, T> {
    map: MapReader<'a, T>,
    key_names: &'k [u64],
    index: usize,
    on_value: bool,
}

impl<'a, T: TokenRead> MapReader<'a, T> {
    /// Adapt this map for lookup by key index.
    ///
    /// `key_names` must be sorted ascending; keys of the underlying map that
    /// are not unsigned integers are passed over.
    #[must_use]
    pub fn filtered<'k>(self, key_names: &'k [u64]) -> FilteredMapReader<'a, 'k, T> {
        debug_assert!(key_names.windows(2).all(|w| w[0] <= w[1]));
        FilteredMapReader {
            map: self,
            key_names,
            index: 0,
            on_value: false,
        }
    }
}

impl<'a, 'k, T: TokenRead> FilteredMapReader<'a, 'k, T> {
    /// Pull the value associated with `key_names[index]`, if the underlying
    /// map has that key.
    ///
    /// Returns `Ok(None)` when the key is absent, or when the scan already
    /// moved past `index` (the monotone contract: requests must be
    /// non-decreasing to be observable).
    ///
    /// # Errors
    ///
    /// Codec/I/O errors from the source; an `index` outside the key table is
    /// a misuse.
    pub fn read_value_by_index(&mut self, index: usize) -> Result<Option<Document<'_, T>>> {
        if index >= self.key_names.len() {
            return Err(Error::misuse(MisuseCode::IndexOutOfRange));
        }
        if self.index > index {
            return Ok(None);
        }

        if self.on_value {
            self.on_value = false;
            if self.index == index {
                return self.map.read_value().map(Some);
            }
            self.map.read_value()?.skip()?;
        }

        loop {
            let Some(key) = self.map.read_key()? else {
                return Ok(None);
            };
            // Only unsigned-integer keys participate in the table.
            let name = match key {
                Document::UnsignedInt(v) => v,
                other => {
                    other.skip()?;
                    self.map.read_value()?.skip()?;
                    continue;
                }
            };

            let Some(found) = self.key_names[self.index..].iter().position(|&k| k == name)
            else {
                // A key we do not know about.
                self.map.read_value()?.skip()?;
                continue;
            };
            self.index += found;

            if self.index == index {
                return self.map.read_value().map(Some);
            }
            if self.index > index {
                // The requested key is not in this map; we stopped on the
                // value of a later one.
                self.on_value = true;
                return Ok(None);
            }
            self.map.read_value()?.skip()?;
        }
    }

    /// Drain any pending value and the rest of the underlying map.
    ///
    /// # Errors
    ///
    /// Codec/I/O errors from the source.
    pub fn skip(mut self) -> Result<()> {
        if self.on_value {
            self.map.read_value()?.skip()?;
            self.on_value = false;
        }
        self.map.skip()
    }
}

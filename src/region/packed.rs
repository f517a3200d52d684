//! Bit-packed palette indices.
//!
//! Entries are laid out back to back, least significant bit first, in a
//! sequence of signed 64-bit words. An entry may straddle two words; its low
//! bits then sit at the top of the first word and its high bits at the bottom
//! of the next one.

/// Bits used per entry for a palette of `palette_len` states.
///
/// `max(2, ceil(log2(palette_len)))`, so palettes of up to four states still
/// take two bits.
pub fn bits_per_entry(palette_len: usize) -> u32 {
    (usize::BITS - palette_len.saturating_sub(1).leading_zeros()).max(2)
}

/// Number of words needed to hold `len` entries of `bits` each.
pub fn word_count(len: usize, bits: u32) -> usize {
    (len * bits as usize + 63) / 64
}

fn entry_mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// Read-only view over packed words.
#[derive(Debug, Clone, Copy)]
pub struct PackedArray<'a> {
    words: &'a [i64],
    bits: u32,
    mask: u64,
}

impl<'a> PackedArray<'a> {
    pub fn new(words: &'a [i64], bits: u32) -> Self {
        Self {
            words,
            bits,
            mask: entry_mask(bits),
        }
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// How many whole entries the backing words can hold.
    pub fn capacity(&self) -> usize {
        if self.bits == 0 {
            return 0;
        }
        self.words.len() * 64 / self.bits as usize
    }

    /// Decode the entry at `index`, or `None` if the words run out first.
    pub fn get(&self, index: usize) -> Option<u64> {
        let bits = self.bits as usize;
        let start_bit = index * bits;
        let start_word = start_bit / 64;
        let end_word = (start_bit + bits - 1) / 64;
        let shift = (start_bit % 64) as u32;

        let low = *self.words.get(start_word)? as u64;
        if start_word == end_word {
            Some((low >> shift) & self.mask)
        } else {
            let high = *self.words.get(end_word)? as u64;
            Some(((low >> shift) | (high << (64 - shift))) & self.mask)
        }
    }

    /// Decode `len` consecutive entries starting at zero.
    pub fn decode(&self, len: usize) -> Option<Vec<u64>> {
        (0..len).map(|i| self.get(i)).collect()
    }

    /// Pack `values` with `bits` per entry. Values wider than `bits` are truncated.
    pub fn encode(values: &[u64], bits: u32) -> Vec<i64> {
        let bits_usize = bits as usize;
        let mask = entry_mask(bits);
        let mut words = vec![0u64; word_count(values.len(), bits)];

        for (index, &value) in values.iter().enumerate() {
            let start_bit = index * bits_usize;
            let start_word = start_bit / 64;
            let end_word = (start_bit + bits_usize - 1) / 64;
            let shift = (start_bit % 64) as u32;
            let value = value & mask;

            words[start_word] |= value << shift;
            if start_word != end_word {
                words[end_word] |= value >> (64 - shift);
            }
        }

        words.into_iter().map(|w| w as i64).collect()
    }
}

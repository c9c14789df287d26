//! Dictionary matching and rotation helpers.

use crate::Dictionary;

/// A dictionary match for an observed marker code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match {
    /// Marker id in the dictionary.
    pub id: u32,
    /// Rotation `0..=3` such that: `observed_code == rotate(dict_code, rotation)`.
    pub rotation: u8,
    /// Hamming distance between observed and dictionary code (after rotation).
    pub hamming: u8,
}

/// Brute-force matcher over all ids and rotations of a fixed dictionary.
///
/// A 250-entry dictionary is 1000 XOR/popcount pairs per candidate, which is
/// negligible next to thresholding a frame.
#[derive(Clone, Debug)]
pub struct Matcher {
    dict: Dictionary,
    max_hamming: u8,
    rotated: Vec<[u64; 4]>,
}

impl Matcher {
    /// Build a matcher for the given dictionary and Hamming threshold.
    ///
    /// The threshold is clamped to the dictionary's correction capacity.
    pub fn new(dict: Dictionary, max_hamming: u8) -> Self {
        let n = dict.marker_size;
        let rotated = dict
            .codes
            .iter()
            .map(|&base| std::array::from_fn(|rot| rotate_code_u64(base, n, rot as u8)))
            .collect();
        let max_hamming = max_hamming.min(dict.max_correction_bits);

        Self {
            dict,
            max_hamming,
            rotated,
        }
    }

    #[inline]
    pub fn dictionary(&self) -> &Dictionary {
        &self.dict
    }

    #[inline]
    pub fn max_hamming(&self) -> u8 {
        self.max_hamming
    }

    /// Find the best match within `max_hamming`. Ties keep the lowest id.
    pub fn match_code(&self, observed: u64) -> Option<Match> {
        let mut best: Option<Match> = None;

        for (id, rots) in self.rotated.iter().enumerate() {
            for (rot, &cand) in rots.iter().enumerate() {
                let h = (observed ^ cand).count_ones() as u8;
                if h > self.max_hamming {
                    continue;
                }
                if h == 0 {
                    return Some(Match {
                        id: id as u32,
                        rotation: rot as u8,
                        hamming: 0,
                    });
                }
                if best.is_none_or(|prev| h < prev.hamming) {
                    best = Some(Match {
                        id: id as u32,
                        rotation: rot as u8,
                        hamming: h,
                    });
                }
            }
        }

        best
    }
}

/// Rotate a code stored in row-major bits: `idx = y * N + x`.
pub fn rotate_code_u64(code: u64, n: usize, rot: u8) -> u64 {
    let rot = rot & 3;
    if rot == 0 {
        return code;
    }

    let mut out = 0u64;
    for y in 0..n {
        for x in 0..n {
            let (sx, sy) = match rot {
                1 => (y, n - 1 - x),
                2 => (n - 1 - x, n - 1 - y),
                _ => (n - 1 - y, x),
            };
            out |= ((code >> (sy * n + sx)) & 1) << (y * n + x);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;

    #[test]
    fn rotate_four_times_is_identity() {
        let code = 0x0000_000b_5a3c_71e4_u64;
        let n = 6;
        let mut r = code;
        for _ in 0..4 {
            r = rotate_code_u64(r, n, 1);
        }
        assert_eq!(code, r);
        assert_eq!(
            rotate_code_u64(rotate_code_u64(code, n, 1), n, 3),
            code,
            "quarter turn and three-quarter turn cancel"
        );
    }

    #[test]
    fn matcher_finds_rotated_code() {
        let dict = builtins::DICT_6X6_250;
        let matcher = Matcher::new(dict.clone(), 0);

        let base = dict.codes[17];
        let observed = rotate_code_u64(base, dict.marker_size, 3);
        let m = matcher.match_code(observed).expect("match");
        assert_eq!(m.id, 17);
        assert_eq!(m.rotation, 3);
        assert_eq!(m.hamming, 0);
    }

    #[test]
    fn matcher_corrects_bit_flips_within_threshold() {
        let dict = builtins::DICT_6X6_250;
        let matcher = Matcher::new(dict.clone(), 3);

        let noisy = dict.codes[42] ^ 0b1000_0000_0100_0001;
        let m = matcher.match_code(noisy).expect("match");
        assert_eq!(m.id, 42);
        assert_eq!(m.hamming, 3);

        let strict = Matcher::new(dict.clone(), 2);
        assert!(strict.match_code(noisy).is_none());
    }

    #[test]
    fn threshold_is_clamped_to_dictionary_capacity() {
        let matcher = Matcher::new(builtins::DICT_6X6_250, 40);
        assert_eq!(matcher.max_hamming(), 5);
    }
}

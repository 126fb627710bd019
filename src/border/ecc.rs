// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Reed-Solomon coding over GF(2^8) with a per-call parity length.
//!
//! Shortened RS(255, k) with the primitive polynomial 0x11D
//! (x^8+x^4+x^3+x^2+1) and first consecutive root alpha^0. Encoding is
//! systematic (data followed by parity). Decoding runs Berlekamp-Massey,
//! Chien search and Forney, then re-checks the syndromes so a miscorrection
//! is reported instead of returned.

use std::sync::OnceLock;

/// Primitive polynomial for GF(2^8).
const PRIM_POLY: u16 = 0x11D;

/// Full codeword length; shorter blocks are zero-padded at the front.
pub const N_MAX: usize = 255;

// --- GF(2^8) arithmetic ---

struct GfTables {
    exp: [u8; 512],
    log: [u8; 256],
}

fn build_gf_tables() -> GfTables {
    let mut exp = [0u8; 512];
    let mut log = [0u8; 256];

    let mut x: u16 = 1;
    for i in 0..255usize {
        exp[i] = x as u8;
        exp[i + 255] = x as u8;
        log[x as usize] = i as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= PRIM_POLY;
        }
    }
    exp[510] = exp[0];
    exp[511] = exp[1];

    GfTables { exp, log }
}

fn gf() -> &'static GfTables {
    static TABLES: OnceLock<GfTables> = OnceLock::new();
    TABLES.get_or_init(build_gf_tables)
}

fn gf_mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let t = gf();
    t.exp[t.log[a as usize] as usize + t.log[b as usize] as usize]
}

/// Multiplicative inverse; `a` must be non-zero.
fn gf_inv(a: u8) -> u8 {
    debug_assert_ne!(a, 0, "zero has no inverse in GF(2^8)");
    let t = gf();
    t.exp[255 - t.log[a as usize] as usize]
}

/// alpha^e for any non-negative exponent.
fn alpha_pow(e: usize) -> u8 {
    gf().exp[e % 255]
}

/// alpha^-e.
fn alpha_inv_pow(e: usize) -> u8 {
    gf().exp[(255 - e % 255) % 255]
}

/// Horner evaluation; `poly[0]` is the highest-degree coefficient.
fn eval_desc(poly: &[u8], x: u8) -> u8 {
    poly.iter().fold(0u8, |acc, &c| gf_mul(acc, x) ^ c)
}

/// Evaluation with `poly[0]` as the constant term.
fn eval_asc(poly: &[u8], x: u8) -> u8 {
    let mut result = 0u8;
    let mut x_pow = 1u8;
    for &coeff in poly {
        result ^= gf_mul(coeff, x_pow);
        x_pow = gf_mul(x_pow, x);
    }
    result
}

fn poly_mul(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; a.len() + b.len() - 1];
    for (i, &ac) in a.iter().enumerate() {
        for (j, &bc) in b.iter().enumerate() {
            out[i + j] ^= gf_mul(ac, bc);
        }
    }
    out
}

/// g(x) = prod_{i=0}^{parity-1} (x - alpha^i), highest degree first.
fn build_generator(parity_len: usize) -> Vec<u8> {
    (0..parity_len).fold(vec![1u8], |g, i| poly_mul(&g, &[1, alpha_pow(i)]))
}

fn generator(parity_len: usize) -> &'static [u8] {
    static CACHE: [OnceLock<Vec<u8>>; N_MAX] = [const { OnceLock::new() }; N_MAX];
    CACHE[parity_len].get_or_init(|| build_generator(parity_len))
}

/// Error returned when a block has more errors than its parity can fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RsDecodeError;

impl core::fmt::Display for RsDecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Reed-Solomon: too many errors to correct")
    }
}

impl std::error::Error for RsDecodeError {}

/// Correction statistics accumulated over several blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RsDecodeStats {
    /// Symbol errors corrected across all blocks.
    pub total_errors: usize,
    /// Sum of `parity / 2` over all blocks.
    pub error_capacity: usize,
    /// Largest number of errors found in one block.
    pub max_block_errors: usize,
    /// Blocks decoded.
    pub num_blocks: usize,
}

impl RsDecodeStats {
    pub(crate) fn record(&mut self, errors: usize, t: usize) {
        self.total_errors += errors;
        self.error_capacity += t;
        self.max_block_errors = self.max_block_errors.max(errors);
        self.num_blocks += 1;
    }
}

/// A Reed-Solomon code with a fixed number of parity symbols.
#[derive(Debug, Clone, Copy)]
pub struct ReedSolomon {
    parity_len: usize,
}

impl ReedSolomon {
    /// `parity_len` must be below 255; a parity of 0 passes data through.
    pub fn new(parity_len: usize) -> Self {
        assert!(parity_len < N_MAX, "parity length {parity_len} leaves no room for data");
        Self { parity_len }
    }

    pub fn parity_len(&self) -> usize {
        self.parity_len
    }

    /// Largest data block this code accepts.
    pub fn max_data_len(&self) -> usize {
        N_MAX - self.parity_len
    }

    /// Correctable symbol errors per block.
    pub fn correctable(&self) -> usize {
        self.parity_len / 2
    }

    /// Systematic encoding: returns `data || parity`.
    ///
    /// # Panics
    /// Panics if `data.len() > self.max_data_len()`.
    pub fn encode(&self, data: &[u8]) -> Vec<u8> {
        assert!(
            data.len() <= self.max_data_len(),
            "data length {} exceeds max {} for parity {}",
            data.len(),
            self.max_data_len(),
            self.parity_len
        );
        let p = self.parity_len;
        let mut out = Vec::with_capacity(data.len() + p);
        out.extend_from_slice(data);
        if p == 0 {
            return out;
        }

        let g = generator(p);
        let mut reg = vec![0u8; p];
        for &byte in data {
            let feedback = byte ^ reg[0];
            for j in 0..p - 1 {
                reg[j] = reg[j + 1] ^ gf_mul(feedback, g[j + 1]);
            }
            reg[p - 1] = gf_mul(feedback, g[p]);
        }
        out.extend_from_slice(&reg);
        out
    }

    /// Decode one block of `data_len + parity_len` symbols.
    ///
    /// Returns the corrected data and the number of symbols that were fixed.
    ///
    /// # Errors
    /// [`RsDecodeError`] if the block length is wrong, more than
    /// `parity_len / 2` symbols are in error, or a correction would land in
    /// the zero padding of the shortened code.
    pub fn decode(
        &self,
        received: &[u8],
        data_len: usize,
    ) -> Result<(Vec<u8>, usize), RsDecodeError> {
        let p = self.parity_len;
        let block_len = data_len + p;
        if received.len() != block_len || block_len > N_MAX {
            return Err(RsDecodeError);
        }
        if p == 0 {
            return Ok((received.to_vec(), 0));
        }

        let padding = N_MAX - block_len;
        let mut full = vec![0u8; N_MAX];
        full[padding..].copy_from_slice(received);

        let syndromes = self.syndromes(&full);
        if syndromes.iter().all(|&s| s == 0) {
            return Ok((received[..data_len].to_vec(), 0));
        }

        let sigma = berlekamp_massey(&syndromes);
        let num_errors = sigma.len() - 1;
        if num_errors > self.correctable() {
            return Err(RsDecodeError);
        }

        let found = chien_search(&sigma).ok_or(RsDecodeError)?;
        let magnitudes = forney(&sigma, &syndromes, &found);

        for (&(_, array_pos), &mag) in found.iter().zip(&magnitudes) {
            if array_pos < padding {
                return Err(RsDecodeError);
            }
            full[array_pos] ^= mag;
        }

        if self.syndromes(&full).iter().any(|&s| s != 0) {
            return Err(RsDecodeError);
        }

        Ok((full[padding..padding + data_len].to_vec(), num_errors))
    }

    /// S_i = r(alpha^i) for i in 0..parity_len.
    fn syndromes(&self, full_block: &[u8]) -> Vec<u8> {
        (0..self.parity_len)
            .map(|i| eval_desc(full_block, alpha_pow(i)))
            .collect()
    }
}

/// Error locator sigma(x), constant term first.
fn berlekamp_massey(syndromes: &[u8]) -> Vec<u8> {
    let n = syndromes.len();

    let mut c = vec![0u8; n + 1];
    c[0] = 1;
    let mut c_len = 1usize;

    let mut b = vec![0u8; n + 1];
    b[0] = 1;
    let mut b_len = 1usize;

    let mut ell = 0usize;
    let mut prev_delta = 1u8;
    let mut m = 1usize;

    for r in 0..n {
        let mut delta = syndromes[r];
        for i in 1..c_len {
            delta ^= gf_mul(c[i], syndromes[r - i]);
        }

        if delta == 0 {
            m += 1;
            continue;
        }

        let factor = gf_mul(delta, gf_inv(prev_delta));
        let lengthen = 2 * ell <= r;
        let saved = if lengthen { Some((c.clone(), c_len)) } else { None };

        c_len = (b_len + m).max(c_len);
        for j in 0..b_len {
            if j + m <= n {
                c[j + m] ^= gf_mul(factor, b[j]);
            }
        }

        if let Some((old_c, old_len)) = saved {
            b.fill(0);
            b[..old_len].copy_from_slice(&old_c[..old_len]);
            b_len = old_len;
            ell = r + 1 - ell;
            prev_delta = delta;
            m = 1;
        } else {
            m += 1;
        }
    }

    c.truncate(c_len.min(n + 1));
    c
}

/// Roots of sigma as (power p, array index 254 - p) pairs, or `None` when
/// the number of roots does not match the locator degree.
fn chien_search(sigma: &[u8]) -> Option<Vec<(usize, usize)>> {
    let expected = sigma.len() - 1;
    let found: Vec<(usize, usize)> = (0..N_MAX)
        .filter(|&p| eval_asc(sigma, alpha_inv_pow(p)) == 0)
        .map(|p| (p, N_MAX - 1 - p))
        .collect();
    (found.len() == expected).then_some(found)
}

/// Error magnitudes: e = X * Omega(X^-1) / Sigma'(X^-1) for FCR 0.
fn forney(sigma: &[u8], syndromes: &[u8], found: &[(usize, usize)]) -> Vec<u8> {
    let two_t = syndromes.len();

    let mut omega = vec![0u8; two_t];
    for (i, &s) in sigma.iter().enumerate().take(two_t) {
        for (j, &syn) in syndromes.iter().enumerate().take(two_t - i) {
            omega[i + j] ^= gf_mul(s, syn);
        }
    }

    // Formal derivative: only odd powers survive in characteristic 2.
    let mut sigma_prime = vec![0u8; sigma.len().saturating_sub(1)];
    for i in (1..sigma.len()).step_by(2) {
        sigma_prime[i - 1] = sigma[i];
    }

    found
        .iter()
        .map(|&(p, _)| {
            let x_inv = alpha_inv_pow(p);
            let denom = eval_asc(&sigma_prime, x_inv);
            if denom == 0 {
                return 0;
            }
            gf_mul(alpha_pow(p), gf_mul(eval_asc(&omega, x_inv), gf_inv(denom)))
        })
        .collect()
}

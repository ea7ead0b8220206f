//! FIR impulse-response storage and overlap-add convolution.
//!
//! Mirrors the real-FFT convolution idiom of `rf-dsp::convolution`
//! (`realfft::{RealFftPlanner, RealToComplex, ComplexToReal}`, spectra
//! cached per FFT size, 1/N inverse-transform normalization) but
//! implements a single fixed-latency block scheme (block size is always
//! `next_pow2` of the impulse response length) rather than a non-uniform
//! partitioned engine.

use std::collections::VecDeque;
use std::sync::Arc;

use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;

fn next_pow2(n: usize) -> usize {
    if n <= 1 {
        1
    } else {
        1usize << (usize::BITS - (n - 1).leading_zeros())
    }
}

/// A materialized FIR ready for convolution at one sample rate.
#[derive(Clone)]
pub struct Filter {
    coeffs: Vec<f64>,
    sample_rate: u32,
    state: Option<ConvState>,
}

/// Per-instance overlap-add state; lazily built on first `convolve` call and
/// invalidated whenever the coefficients change.
#[derive(Clone)]
struct ConvState {
    block_size: usize,
    fft_size: usize,
    r2c: Arc<dyn RealToComplex<f64>>,
    c2r: Arc<dyn ComplexToReal<f64>>,
    ir_spectrum: Vec<Complex<f64>>,
    input_acc: Vec<f64>,
    acc_len: usize,
    tail: Vec<f64>,
    output_queue: VecDeque<f64>,
}

impl ConvState {
    fn new(coeffs: &[f64]) -> Self {
        let l = coeffs.len();
        let block_size = next_pow2(l);
        let fft_size = block_size * 2;

        let mut planner = RealFftPlanner::<f64>::new();
        let r2c = planner.plan_fft_forward(fft_size);
        let c2r = planner.plan_fft_inverse(fft_size);

        let mut padded = vec![0.0; fft_size];
        padded[..l].copy_from_slice(coeffs);
        let mut ir_spectrum = r2c.make_output_vec();
        if let Err(e) = r2c.process(&mut padded, &mut ir_spectrum) {
            log::error!("FIR spectrum build failed: {e}");
        }

        Self {
            block_size,
            fft_size,
            r2c,
            c2r,
            ir_spectrum,
            input_acc: vec![0.0; block_size],
            acc_len: 0,
            tail: vec![0.0; block_size],
            output_queue: VecDeque::new(),
        }
    }

    fn process_pending_block(&mut self) {
        let mut padded = vec![0.0; self.fft_size];
        padded[..self.block_size].copy_from_slice(&self.input_acc);

        let mut spectrum = self.r2c.make_output_vec();
        if let Err(e) = self.r2c.process(&mut padded, &mut spectrum) {
            log::error!("FIR input transform failed: {e}");
            self.output_queue.extend(std::iter::repeat(0.0).take(self.block_size));
            return;
        }

        let mut product: Vec<Complex<f64>> = spectrum
            .iter()
            .zip(&self.ir_spectrum)
            .map(|(a, b)| a * b)
            .collect();

        let mut time = vec![0.0; self.fft_size];
        if let Err(e) = self.c2r.process(&mut product, &mut time) {
            log::error!("FIR inverse transform failed: {e}");
            self.output_queue.extend(std::iter::repeat(0.0).take(self.block_size));
            return;
        }

        let norm = 1.0 / self.fft_size as f64;
        for i in 0..self.block_size {
            let sample = time[i] * norm + self.tail[i];
            self.output_queue.push_back(sample.clamp(-1.0, 1.0));
            self.tail[i] = time[self.block_size + i] * norm;
        }
    }
}

impl Filter {
    pub fn new(coeffs: Vec<f64>, sample_rate: u32) -> Self {
        Self { coeffs, sample_rate, state: None }
    }

    pub fn empty(sample_rate: u32) -> Self {
        Self::new(Vec::new(), sample_rate)
    }

    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Convolve one block; `output.len()` must equal `input.len()`.
    /// An empty filter (L = 0) zero-fills the output.
    pub fn convolve(&mut self, input: &[f64], output: &mut [f64]) {
        debug_assert_eq!(input.len(), output.len());
        if self.coeffs.is_empty() {
            output.fill(0.0);
            return;
        }
        let state = self.state.get_or_insert_with(|| ConvState::new(&self.coeffs));

        for (i, &sample) in input.iter().enumerate() {
            state.input_acc[state.acc_len] = sample;
            state.acc_len += 1;
            if state.acc_len == state.block_size {
                state.process_pending_block();
                state.acc_len = 0;
            }
            output[i] = state.output_queue.pop_front().unwrap_or(0.0);
        }
    }

    /// Coefficient-wise addition, length = max(len(self), len(other)).
    pub fn add(&self, other: &Filter) -> Filter {
        let len = self.coeffs.len().max(other.coeffs.len());
        let mut out = vec![0.0; len];
        for (i, c) in self.coeffs.iter().enumerate() {
            out[i] += c;
        }
        for (i, c) in other.coeffs.iter().enumerate() {
            out[i] += c;
        }
        Filter::new(out, self.sample_rate)
    }

    /// Scalar coefficient multiplication.
    pub fn scale(&self, factor: f64) -> Filter {
        Filter::new(self.coeffs.iter().map(|c| c * factor).collect(), self.sample_rate)
    }

    /// `gain_estimate = sqrt(sum c^2)`; returns `self * (compensation / gain_estimate)`.
    pub fn normalize(&self, compensation: f64) -> Filter {
        let gain_estimate = self.coeffs.iter().map(|c| c * c).sum::<f64>().sqrt();
        if gain_estimate <= 0.0 {
            return self.clone();
        }
        self.scale(compensation / gain_estimate)
    }

    /// Order reduction via DFT resize.
    pub fn reduce_order(&self, target_order: usize) -> Filter {
        if self.coeffs.is_empty() || target_order >= self.coeffs.len() {
            return self.clone();
        }

        let src_fft_len = next_pow2(self.coeffs.len());
        let mut padded = vec![0.0; src_fft_len];
        padded[..self.coeffs.len()].copy_from_slice(&self.coeffs);

        let mut planner = RealFftPlanner::<f64>::new();
        let r2c = planner.plan_fft_forward(src_fft_len);
        let mut spectrum = r2c.make_output_vec();
        if let Err(e) = r2c.process(&mut padded, &mut spectrum) {
            log::error!("order reduction forward transform failed: {e}");
            return self.clone();
        }

        let dst_fft_len = next_pow2(target_order);
        let dst_half_len = dst_fft_len / 2 + 1;
        let mut resampled = resample_complex(&spectrum, dst_half_len);

        let c2r = planner.plan_fft_inverse(dst_fft_len);
        let mut time = vec![0.0; dst_fft_len];
        if let Err(e) = c2r.process(&mut resampled, &mut time) {
            log::error!("order reduction inverse transform failed: {e}");
            return self.clone();
        }

        let norm = 1.0 / dst_fft_len as f64;
        let mut out: Vec<f64> = time.iter().take(target_order).map(|v| v * norm).collect();
        out.resize(target_order, 0.0);
        Filter::new(out, self.sample_rate)
    }

    pub fn reset(&mut self) {
        self.state = None;
    }
}

/// Linear interpolation of a complex spectrum's positive-frequency half to
/// a new length.
fn resample_complex(src: &[Complex<f64>], dst_len: usize) -> Vec<Complex<f64>> {
    if dst_len == src.len() || src.len() < 2 {
        let mut out = src.to_vec();
        out.resize(dst_len, Complex::new(0.0, 0.0));
        return out;
    }
    let src_len = src.len();
    (0..dst_len)
        .map(|i| {
            let pos = i as f64 * (src_len - 1) as f64 / (dst_len - 1).max(1) as f64;
            let lo = pos.floor() as usize;
            let hi = (lo + 1).min(src_len - 1);
            let frac = pos - lo as f64;
            src[lo] * (1.0 - frac) + src[hi] * frac
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct_convolve(input: &[f64], ir: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; input.len()];
        for (n, o) in out.iter_mut().enumerate() {
            let mut sum = 0.0;
            for (k, &c) in ir.iter().enumerate() {
                if k <= n {
                    sum += c * input[n - k];
                }
            }
            *o = sum.clamp(-1.0, 1.0);
        }
        out
    }

    #[test]
    fn empty_filter_zero_fills() {
        let mut f = Filter::empty(48000);
        let input = vec![1.0; 16];
        let mut output = vec![0.0; 16];
        f.convolve(&input, &mut output);
        assert!(output.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn overlap_add_matches_direct_convolution() {
        let ir = vec![1.0, 0.5, -0.25, 0.125];
        let input: Vec<f64> = (0..256).map(|i| ((i as f64) * 0.07).sin() * 0.1).collect();
        let expected = direct_convolve(&input, &ir);

        let mut f = Filter::new(ir, 48000);
        let mut output = vec![0.0; input.len()];
        f.convolve(&input, &mut output);

        for (a, b) in output.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-9, "{a} vs {b}");
        }
    }

    #[test]
    fn addition_is_linear() {
        let a = Filter::new(vec![1.0, 0.5], 48000);
        let b = Filter::new(vec![0.2, 0.1, 0.05], 48000);
        let combined = a.add(&b);

        let input: Vec<f64> = (0..64).map(|i| (i as f64 * 0.1).sin() * 0.2).collect();

        let mut out_a = vec![0.0; input.len()];
        let mut out_b = vec![0.0; input.len()];
        let mut out_combined = vec![0.0; input.len()];
        a.clone().convolve(&input, &mut out_a);
        b.clone().convolve(&input, &mut out_b);
        combined.clone().convolve(&input, &mut out_combined);

        for i in 0..input.len() {
            let sum = (out_a[i] + out_b[i]).clamp(-1.0, 1.0);
            assert!((sum - out_combined[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn normalize_matches_compensation() {
        let f = Filter::new(vec![1.0, 2.0, 3.0], 48000);
        let normalized = f.normalize(2.0);
        let gain: f64 = normalized.coeffs.iter().map(|c| c * c).sum::<f64>().sqrt();
        assert!((gain - 2.0).abs() < 1e-12);
    }

    #[test]
    fn reduce_order_changes_length_keeps_rate() {
        let f = Filter::new(vec![1.0; 1000], 44100);
        let reduced = f.reduce_order(256);
        assert_eq!(reduced.coeffs.len(), 256);
        assert_eq!(reduced.sample_rate(), 44100);
    }
}

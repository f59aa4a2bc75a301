//! Butterworth band-pass filtering with second-order sections (biquads).
//!
//! The band-pass is a high-pass of the requested order cascaded with a
//! low-pass of the same order, each designed from the analog prototype via
//! the bilinear transform with frequency prewarping.  [`SosFilter::filtfilt`]
//! runs the cascade forward and backward for zero phase distortion.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest order accepted by [`design_bandpass`].
pub const MAX_ORDER: usize = 16;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FilterError {
    #[error("sample rate must be positive, got {0} Hz")]
    InvalidSampleRate(f64),

    #[error("filter order must be between 1 and {}, got {0}", MAX_ORDER)]
    InvalidOrder(usize),

    #[error("band {low}-{high} Hz must satisfy 0 < low < high < {nyquist} Hz (Nyquist)")]
    InvalidBand { low: f64, high: f64, nyquist: f64 },

    #[error("cannot filter an empty signal")]
    EmptySignal,

    #[error("signal contains non-finite sample at index {0}")]
    NonFiniteInput(usize),

    #[error("filter output is not finite")]
    NonFiniteOutput,
}

/// Band-pass parameters for one conditioning run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandSpec {
    /// Low cutoff in Hz.
    pub low: f64,
    /// High cutoff in Hz.
    pub high: f64,
    /// Sampling rate in Hz.
    pub sample_rate: f64,
    /// Order of each of the high-pass and low-pass halves.
    pub order: usize,
}

impl BandSpec {
    pub fn validate(&self) -> Result<(), FilterError> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(FilterError::InvalidSampleRate(self.sample_rate));
        }
        if self.order == 0 || self.order > MAX_ORDER {
            return Err(FilterError::InvalidOrder(self.order));
        }
        let nyquist = self.sample_rate / 2.0;
        let ordered = self.low > 0.0 && self.low < self.high && self.high < nyquist;
        if !ordered || !self.low.is_finite() || !self.high.is_finite() {
            return Err(FilterError::InvalidBand {
                low: self.low,
                high: self.high,
                nyquist,
            });
        }
        Ok(())
    }
}

/// Second-order section coefficients, normalized so `a0 == 1`.
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    /// Gain at DC (z = 1).
    fn dc_gain(&self) -> f64 {
        (self.b0 + self.b1 + self.b2) / (1.0 + self.a1 + self.a2)
    }

    /// First-order sections leave `b2` and `a2` at zero.
    fn is_first_order(&self) -> bool {
        self.b2 == 0.0 && self.a2 == 0.0
    }
}

/// Single biquad section with Direct Form II Transposed state.
#[derive(Debug, Clone)]
struct BiquadFilter {
    coeffs: BiquadCoeffs,
    z1: f64,
    z2: f64,
}

impl BiquadFilter {
    fn new(coeffs: BiquadCoeffs) -> Self {
        Self {
            coeffs,
            z1: 0.0,
            z2: 0.0,
        }
    }

    #[inline]
    fn process(&mut self, input: f64) -> f64 {
        let c = &self.coeffs;
        let output = c.b0 * input + self.z1;
        self.z1 = c.b1 * input - c.a1 * output + self.z2;
        self.z2 = c.b2 * input - c.a2 * output;
        output
    }

    /// Set the state a constant `input` would settle to; returns the settled output.
    fn settle(&mut self, input: f64) -> f64 {
        let c = self.coeffs;
        let output = input * c.dc_gain();
        self.z2 = c.b2 * input - c.a2 * output;
        self.z1 = (c.b1 + c.b2) * input - (c.a1 + c.a2) * output;
        output
    }
}

/// Cascaded second-order sections filter.
#[derive(Debug, Clone)]
pub struct SosFilter {
    sections: Vec<BiquadFilter>,
}

impl SosFilter {
    pub fn new(sections: Vec<BiquadCoeffs>) -> Self {
        Self {
            sections: sections.into_iter().map(BiquadFilter::new).collect(),
        }
    }

    pub fn coefficients(&self) -> Vec<BiquadCoeffs> {
        self.sections.iter().map(|s| s.coeffs).collect()
    }

    /// Process a single sample through all sections.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        self.sections
            .iter_mut()
            .fold(input, |acc, section| section.process(acc))
    }

    pub fn reset(&mut self) {
        for section in &mut self.sections {
            section.z1 = 0.0;
            section.z2 = 0.0;
        }
    }

    /// Put every section in the steady state for a constant input `x0`.
    pub fn settle(&mut self, x0: f64) {
        self.sections
            .iter_mut()
            .fold(x0, |acc, section| section.settle(acc));
    }

    /// Number of taps of the equivalent single transfer function, used for padding.
    fn ntaps(&self) -> usize {
        let first_order = self
            .sections
            .iter()
            .filter(|s| s.coeffs.is_first_order())
            .count();
        2 * self.sections.len() + 1 - first_order
    }

    /// Zero-phase filtering: forward pass, then backward pass over the result.
    ///
    /// The signal is extended at both ends by odd reflection of
    /// `min(3 * ntaps, len - 1)` samples and each pass starts from the steady
    /// state for its first sample, which keeps edge transients small even for
    /// short recordings.
    pub fn filtfilt(&mut self, signal: &[f64]) -> Result<Vec<f64>, FilterError> {
        if signal.is_empty() {
            return Err(FilterError::EmptySignal);
        }
        if let Some(idx) = signal.iter().position(|v| !v.is_finite()) {
            return Err(FilterError::NonFiniteInput(idx));
        }

        let n = signal.len();
        let pad = (3 * self.ntaps()).min(n - 1);
        let extended = odd_extend(signal, pad);

        let mut forward = self.run_from_steady_state(&extended);
        forward.reverse();
        let mut backward = self.run_from_steady_state(&forward);
        backward.reverse();

        let out: Vec<f64> = backward[pad..pad + n].to_vec();
        if out.iter().any(|v| !v.is_finite()) {
            return Err(FilterError::NonFiniteOutput);
        }
        Ok(out)
    }

    fn run_from_steady_state(&mut self, signal: &[f64]) -> Vec<f64> {
        self.reset();
        if let Some(&first) = signal.first() {
            self.settle(first);
        }
        signal.iter().map(|&s| self.process(s)).collect()
    }
}

/// `[2*x0 - x[pad..1], x, 2*xn - x[n-2..n-1-pad]]`
fn odd_extend(signal: &[f64], pad: usize) -> Vec<f64> {
    let n = signal.len();
    let first = signal[0];
    let last = signal[n - 1];

    let mut out = Vec::with_capacity(n + 2 * pad);
    out.extend((1..=pad).rev().map(|i| 2.0 * first - signal[i]));
    out.extend_from_slice(signal);
    out.extend((1..=pad).map(|i| 2.0 * last - signal[n - 1 - i]));
    out
}

/// Prewarp an analog frequency for the bilinear transform.
fn prewarp(freq: f64, sample_rate: f64) -> f64 {
    (PI * freq / sample_rate).tan()
}

/// Damping terms `2 sin((2k+1) pi / 2N)` of the Butterworth pole pairs.
fn pole_pair_damping(order: usize) -> impl Iterator<Item = f64> {
    (0..order / 2).map(move |k| 2.0 * (PI * (2 * k + 1) as f64 / (2 * order) as f64).sin())
}

/// Butterworth low-pass sections for prewarped cutoff `w`.
fn lowpass_sections(w: f64, order: usize) -> Vec<BiquadCoeffs> {
    let w2 = w * w;
    let mut sections: Vec<BiquadCoeffs> = pole_pair_damping(order)
        .map(|d| {
            let denom = 1.0 + d * w + w2;
            BiquadCoeffs {
                b0: w2 / denom,
                b1: 2.0 * w2 / denom,
                b2: w2 / denom,
                a1: 2.0 * (w2 - 1.0) / denom,
                a2: (1.0 - d * w + w2) / denom,
            }
        })
        .collect();

    if order % 2 == 1 {
        let k = w / (1.0 + w);
        sections.push(BiquadCoeffs {
            b0: k,
            b1: k,
            b2: 0.0,
            a1: (w - 1.0) / (w + 1.0),
            a2: 0.0,
        });
    }
    sections
}

/// Butterworth high-pass sections for prewarped cutoff `w`.
fn highpass_sections(w: f64, order: usize) -> Vec<BiquadCoeffs> {
    let w2 = w * w;
    let mut sections: Vec<BiquadCoeffs> = pole_pair_damping(order)
        .map(|d| {
            let denom = 1.0 + d * w + w2;
            BiquadCoeffs {
                b0: 1.0 / denom,
                b1: -2.0 / denom,
                b2: 1.0 / denom,
                a1: 2.0 * (w2 - 1.0) / denom,
                a2: (1.0 - d * w + w2) / denom,
            }
        })
        .collect();

    if order % 2 == 1 {
        let k = 1.0 / (1.0 + w);
        sections.push(BiquadCoeffs {
            b0: k,
            b1: -k,
            b2: 0.0,
            a1: (w - 1.0) / (w + 1.0),
            a2: 0.0,
        });
    }
    sections
}

/// Design a Butterworth band-pass for `spec`.
pub fn design_bandpass(spec: &BandSpec) -> Result<SosFilter, FilterError> {
    spec.validate()?;
    let mut sections = highpass_sections(prewarp(spec.low, spec.sample_rate), spec.order);
    sections.extend(lowpass_sections(
        prewarp(spec.high, spec.sample_rate),
        spec.order,
    ));
    Ok(SosFilter::new(sections))
}

/// Design the band-pass and apply it with zero phase.
pub fn bandpass_filtfilt(signal: &[f64], spec: &BandSpec) -> Result<Vec<f64>, FilterError> {
    design_bandpass(spec)?.filtfilt(signal)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FS: f64 = 255.0;

    fn spec(order: usize) -> BandSpec {
        BandSpec {
            low: 1.0,
            high: 50.0,
            sample_rate: FS,
            order,
        }
    }

    fn sine(freq: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / FS).sin())
            .collect()
    }

    fn rms(x: &[f64]) -> f64 {
        (x.iter().map(|v| v * v).sum::<f64>() / x.len() as f64).sqrt()
    }

    #[test]
    fn rejects_invalid_parameters() {
        let mut s = spec(4);
        s.high = 200.0;
        assert!(matches!(design_bandpass(&s), Err(FilterError::InvalidBand { .. })));

        let mut s = spec(4);
        s.low = 60.0;
        assert!(matches!(design_bandpass(&s), Err(FilterError::InvalidBand { .. })));

        let mut s = spec(4);
        s.low = 0.0;
        assert!(matches!(design_bandpass(&s), Err(FilterError::InvalidBand { .. })));

        assert!(matches!(design_bandpass(&spec(0)), Err(FilterError::InvalidOrder(0))));

        let mut s = spec(4);
        s.sample_rate = 0.0;
        assert!(matches!(design_bandpass(&s), Err(FilterError::InvalidSampleRate(_))));
    }

    #[test]
    fn section_count_matches_order() {
        assert_eq!(design_bandpass(&spec(4)).unwrap().coefficients().len(), 4);
        assert_eq!(design_bandpass(&spec(3)).unwrap().coefficients().len(), 4);
        assert_eq!(design_bandpass(&spec(1)).unwrap().coefficients().len(), 2);
    }

    #[test]
    fn sections_are_stable() {
        for order in 1..=8 {
            for c in design_bandpass(&spec(order)).unwrap().coefficients() {
                // Stability triangle for a1, a2.
                assert!(c.a2.abs() < 1.0, "order {order}: a2 = {}", c.a2);
                assert!(c.a1.abs() < 1.0 + c.a2, "order {order}: a1 = {}", c.a1);
            }
        }
    }

    #[test]
    fn passband_sine_keeps_amplitude_and_phase() {
        let input = sine(10.0, 2550);
        let output = bandpass_filtfilt(&input, &spec(4)).unwrap();

        let mid = 500..2050;
        let ratio = rms(&output[mid.clone()]) / rms(&input[mid.clone()]);
        assert!((ratio - 1.0).abs() < 0.05, "passband gain {ratio}");

        let max_err = mid
            .map(|i| (output[i] - input[i]).abs())
            .fold(0.0_f64, f64::max);
        assert!(max_err < 0.05, "zero-phase error {max_err}");
    }

    #[test]
    fn stopband_sine_is_attenuated() {
        let input = sine(100.0, 2550);
        let output = bandpass_filtfilt(&input, &spec(4)).unwrap();
        assert!(rms(&output[500..2050]) < 0.05 * rms(&input[500..2050]));
    }

    #[test]
    fn constant_offset_is_removed() {
        let output = bandpass_filtfilt(&[5.0; 600], &spec(4)).unwrap();
        assert!(output.iter().all(|v| v.abs() < 1e-6));
    }

    #[test]
    fn short_signals_are_filtered() {
        let input: Vec<f64> = (0..20).map(|i| ((i * 7) % 11) as f64).collect();
        let output = bandpass_filtfilt(&input, &spec(4)).unwrap();
        assert_eq!(output.len(), 20);
        assert!(output.iter().all(|v| v.is_finite()));
        assert_ne!(output, input);

        let single = bandpass_filtfilt(&[3.0], &spec(4)).unwrap();
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn rejects_empty_and_non_finite_input() {
        assert_eq!(bandpass_filtfilt(&[], &spec(4)), Err(FilterError::EmptySignal));
        assert_eq!(
            bandpass_filtfilt(&[1.0, f64::INFINITY, 2.0], &spec(4)),
            Err(FilterError::NonFiniteInput(1))
        );
    }

    #[test]
    fn odd_extension_reflects_about_endpoints() {
        let ext = odd_extend(&[1.0, 2.0, 4.0], 2);
        assert_eq!(ext, vec![-2.0, 0.0, 1.0, 2.0, 4.0, 6.0, 7.0]);
    }
}

//! Classic EEG frequency bands and average band power

use crate::spectrum::{nearest_bin, Spectrum};
use serde::{Deserialize, Serialize};

/// Band boundaries in Hz: delta 1-4, theta 4-8, alpha 8-13, beta 13-30, gamma 30-45
pub const EEG_BAND_EDGES: [f64; 6] = [1.0, 4.0, 8.0, 13.0, 30.0, 45.0];

/// Number of bands reported
pub const BAND_COUNT: usize = EEG_BAND_EDGES.len() - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EegBand {
    Delta,
    Theta,
    Alpha,
    Beta,
    Gamma,
}

impl EegBand {
    pub const ALL: [EegBand; BAND_COUNT] = [
        EegBand::Delta,
        EegBand::Theta,
        EegBand::Alpha,
        EegBand::Beta,
        EegBand::Gamma,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EegBand::Delta => "delta",
            EegBand::Theta => "theta",
            EegBand::Alpha => "alpha",
            EegBand::Beta => "beta",
            EegBand::Gamma => "gamma",
        }
    }

    /// `(low, high)` edges in Hz
    pub fn range(self) -> (f64, f64) {
        let i = self as usize;
        (EEG_BAND_EDGES[i], EEG_BAND_EDGES[i + 1])
    }
}

impl std::fmt::Display for EegBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Average power per band, delta first
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BandPowers(pub [f64; BAND_COUNT]);

impl BandPowers {
    pub fn get(&self, band: EegBand) -> f64 {
        self.0[band as usize]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Band with the highest power; `None` when all bands are zero
    pub fn dominant(&self) -> Option<EegBand> {
        let (band, power) = EegBand::ALL
            .iter()
            .map(|&b| (b, self.get(b)))
            .max_by(|a, b| a.1.total_cmp(&b.1))?;
        (power > 0.0).then_some(band)
    }

    /// Min-max scaled copy
    pub fn normalized(&self) -> BandPowers {
        let scaled = crate::scaling::normalize(&self.0[..]);
        let mut out = [0.0; BAND_COUNT];
        out.copy_from_slice(&scaled);
        BandPowers(out)
    }
}

/// Average power of each band of a cropped spectrum.
///
/// Each band sums the bins `[nearest(low), nearest(high))` and divides by the
/// band width in Hz. An empty spectrum yields zeros.
pub fn average_band_power(freqs: &[f64], power: &[f64]) -> BandPowers {
    let mut out = [0.0; BAND_COUNT];
    let len = freqs.len().min(power.len());
    if len == 0 {
        return BandPowers(out);
    }
    let freqs = &freqs[..len];

    for (slot, band) in out.iter_mut().zip(EegBand::ALL) {
        let (low, high) = band.range();
        let lo = nearest_bin(freqs, low);
        let hi = nearest_bin(freqs, high);
        if hi > lo {
            *slot = power[lo..hi].iter().sum::<f64>() / (high - low);
        }
    }
    BandPowers(out)
}

/// [`average_band_power`] over a [`Spectrum`]
pub fn spectrum_band_power(spectrum: &Spectrum) -> BandPowers {
    average_band_power(&spectrum.freqs, &spectrum.power)
}

//! Residual-based stabilization: method selection, the element stabilization parameter
//! $\tau$ and the per-element $\tau$ storage shared between integrands.
use crate::integrand::IntegrandError;
use crate::Real;
use log::warn;
use nalgebra::{convert, try_convert};
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Available stabilization methods.
///
/// With $L u = \vec U \cdot \nabla u - \kappa \Delta u + r u$, the methods add
/// $\sum_K \tau_K (w, L u - s)_K$ with the weighting function
///
/// - SUPG: $w = \vec U \cdot \nabla v$,
/// - GLS: $w = L v$,
/// - MS (multiscale): $w = -L^* v = \vec U \cdot \nabla v + \kappa \Delta v - r v$.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stabilization {
    #[default]
    None,
    Supg,
    Gls,
    Ms,
}

impl Stabilization {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl Display for Stabilization {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Supg => "supg",
            Self::Gls => "gls",
            Self::Ms => "ms",
        };
        write!(f, "{name}")
    }
}

/// Returned when parsing an unknown stabilization method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStabilizationError(String);

impl Display for ParseStabilizationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "unknown stabilization method \"{}\" (expected none, supg, gls or ms)", self.0)
    }
}

impl std::error::Error for ParseStabilizationError {}

impl FromStr for Stabilization {
    type Err = ParseStabilizationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "supg" => Ok(Self::Supg),
            "gls" => Ok(Self::Gls),
            "ms" | "multiscale" => Ok(Self::Ms),
            _ => Err(ParseStabilizationError(s.to_string())),
        }
    }
}

/// Computes the element stabilization parameter.
///
/// The diffusive rate $r_d = C_{inv} \kappa p^2 / h_K^2$ and the advective rate
/// $r_a = 2 |\vec U| / h_K$ are blended as
///
/// $$ \tau = \left( r_a^2 + r_d^2 \right)^{-1/2}, $$
///
/// so that $\tau \to h_K^2 / (C_{inv} \kappa p^2)$ as $|\vec U| \to 0$ and
/// $\tau \to h_K / (2 |\vec U|)$ as $|\vec U| \to \infty$.
/// If both rates vanish there is nothing to stabilize and zero is returned.
///
/// The element size `hk` must be positive.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn compute_tau<T: Real>(kappa: T, cinv: T, order: usize, hk: T, velocity_magnitude: T) -> T {
    let p = T::from_usize(order).expect("Polynomial order must fit in T");
    let diffusive_rate = cinv * kappa * p * p / (hk * hk);
    let advective_rate = 2.0 * velocity_magnitude / hk;
    let rate_squared = advective_rate * advective_rate + diffusive_rate * diffusive_rate;
    if rate_squared > 0.0 {
        1.0 / rate_squared.sqrt()
    } else {
        0.0
    }
}

/// Per-element storage of stabilization parameters.
///
/// The cache is sized once before an assembly pass and each slot is written by exactly one
/// element. Slots are atomic, so elements finalized concurrently on different threads
/// can write their values through a shared reference.
#[derive(Debug, Default)]
pub struct TauCache {
    values: Vec<AtomicU64>,
}

impl Clone for TauCache {
    fn clone(&self) -> Self {
        Self {
            values: self
                .values
                .iter()
                .map(|v| AtomicU64::new(v.load(Ordering::Relaxed)))
                .collect(),
        }
    }
}

impl TauCache {
    pub fn new(num_elements: usize) -> Self {
        let mut cache = Self::default();
        cache.resize(num_elements);
        cache
    }

    /// Resizes the cache to `num_elements` slots and resets all of them to zero.
    pub fn resize(&mut self, num_elements: usize) {
        self.values.clear();
        self.values
            .resize_with(num_elements, || AtomicU64::new(0.0f64.to_bits()));
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn store<T: Real>(&self, element_index: usize, tau: T) -> Result<(), IntegrandError> {
        let slot = self
            .values
            .get(element_index)
            .ok_or(IntegrandError::ElementIndexOutOfRange {
                index: element_index,
                num_elements: self.len(),
            })?;
        let value: f64 = try_convert(tau).unwrap_or(f64::NAN);
        if !value.is_finite() {
            warn!("Non-finite stabilization parameter {value} for element {element_index}");
        }
        slot.store(value.to_bits(), Ordering::Relaxed);
        Ok(())
    }

    /// Returns the stored value for the element, or zero if the index is out of range.
    pub fn get<T: Real>(&self, element_index: usize) -> T {
        self.values
            .get(element_index)
            .map(|slot| convert(f64::from_bits(slot.load(Ordering::Relaxed))))
            .unwrap_or_else(T::zero)
    }

    pub fn to_vec<T: Real>(&self) -> Vec<T> {
        (0..self.len()).map(|i| self.get(i)).collect()
    }
}

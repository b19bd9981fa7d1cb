//! The closed table of rotation routines.

use crate::element::Precision;
use std::fmt;

/// One of the six (element, sine) instantiations of the batched rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RotVariant {
    /// `f32` elements, `f32` sine.
    Srot,
    /// `f64` elements, `f64` sine.
    Drot,
    /// `Complex32` elements, `Complex32` sine.
    Crot,
    /// `Complex32` elements, `f32` sine.
    Csrot,
    /// `Complex64` elements, `Complex64` sine.
    Zrot,
    /// `Complex64` elements, `f64` sine.
    Zdrot,
}

impl RotVariant {
    /// Every variant, in table order.
    pub const ALL: [Self; 6] = [
        Self::Srot,
        Self::Drot,
        Self::Crot,
        Self::Csrot,
        Self::Zrot,
        Self::Zdrot,
    ];

    /// Routine name without library prefix, e.g. `csrot_batched`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Srot => "srot_batched",
            Self::Drot => "drot_batched",
            Self::Crot => "crot_batched",
            Self::Csrot => "csrot_batched",
            Self::Zrot => "zrot_batched",
            Self::Zdrot => "zdrot_batched",
        }
    }

    /// Exported C symbol for this routine.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Srot => "batchrot_srot_batched",
            Self::Drot => "batchrot_drot_batched",
            Self::Crot => "batchrot_crot_batched",
            Self::Csrot => "batchrot_csrot_batched",
            Self::Zrot => "batchrot_zrot_batched",
            Self::Zdrot => "batchrot_zdrot_batched",
        }
    }

    /// Precision of the vector elements.
    #[must_use]
    pub const fn element_precision(self) -> Precision {
        match self {
            Self::Srot => Precision::F32Real,
            Self::Drot => Precision::F64Real,
            Self::Crot | Self::Csrot => Precision::F32Complex,
            Self::Zrot | Self::Zdrot => Precision::F64Complex,
        }
    }

    /// Precision of the cosine, always real.
    #[must_use]
    pub const fn cosine_precision(self) -> Precision {
        self.element_precision().real()
    }

    /// Precision of the sine.
    #[must_use]
    pub const fn sine_precision(self) -> Precision {
        match self {
            Self::Srot | Self::Csrot => Precision::F32Real,
            Self::Drot | Self::Zdrot => Precision::F64Real,
            Self::Crot => Precision::F32Complex,
            Self::Zrot => Precision::F64Complex,
        }
    }

    /// Whether the y-update conjugates the sine.
    #[must_use]
    pub const fn conjugates_sine(self) -> bool {
        self.sine_precision().is_complex()
    }

    /// Look up the variant for an element and sine precision pair.
    ///
    /// Returns `None` for pairs outside the table, such as a complex sine
    /// with real elements or mixed widths.
    #[must_use]
    pub fn from_precisions(element: Precision, sine: Precision) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.element_precision() == element && v.sine_precision() == sine)
    }
}

impl fmt::Display for RotVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

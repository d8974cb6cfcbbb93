use super::potentials;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Finite stand-in for an infinite overlap energy. Small enough that the
/// double-counted sum over every object in a configuration stays
/// representable.
pub const DEFAULT_BIG_ENERGY: f64 = 1e10;

#[derive(Debug, Error)]
pub enum ForceFieldError {
    #[error("No atom types defined")]
    Empty,

    #[error("Atom type {atom_type} has a negative hard radius ({radius})")]
    NegativeRadius { atom_type: usize, radius: f64 },

    #[error("Well-depth matrix must be {expected}x{expected}, got row of length {found}")]
    WellMatrixShape { expected: usize, found: usize },

    #[error("Well-depth matrix is not symmetric at ({0}, {1})")]
    AsymmetricWells(usize, usize),

    #[error("Cutoff ({cutoff}) and length scale ({length_scale}) must satisfy cutoff >= length_scale > 0")]
    BadLengthScales { cutoff: f64, length_scale: f64 },
}

#[derive(Debug, Error)]
pub enum ParamLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },

    #[error("Invalid force field in '{path}': {source}")]
    Invalid {
        path: String,
        source: ForceFieldError,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawForceField {
    radii: Vec<f64>,
    wells: Vec<Vec<f64>>,
    cutoff: f64,
    length_scale: f64,
    big_energy: Option<f64>,
}

/// Pairwise interaction rules between atom types: hard radii, a symmetric
/// well-depth matrix, and the truncated flat-bottom cosine well they
/// parameterize.
#[derive(Debug, Clone, PartialEq)]
pub struct ForceField {
    radii: Vec<f64>,
    wells: Vec<Vec<f64>>,
    cutoff: f64,
    length_scale: f64,
    big_energy: f64,
}

impl ForceField {
    pub fn new(
        radii: Vec<f64>,
        wells: Vec<Vec<f64>>,
        cutoff: f64,
        length_scale: f64,
        big_energy: f64,
    ) -> Result<Self, ForceFieldError> {
        let n = radii.len();
        if n == 0 {
            return Err(ForceFieldError::Empty);
        }
        for (atom_type, &radius) in radii.iter().enumerate() {
            if radius < 0.0 {
                return Err(ForceFieldError::NegativeRadius { atom_type, radius });
            }
        }
        if wells.len() != n {
            return Err(ForceFieldError::WellMatrixShape {
                expected: n,
                found: wells.len(),
            });
        }
        for row in &wells {
            if row.len() != n {
                return Err(ForceFieldError::WellMatrixShape {
                    expected: n,
                    found: row.len(),
                });
            }
        }
        for i in 0..n {
            for j in (i + 1)..n {
                if wells[i][j] != wells[j][i] {
                    return Err(ForceFieldError::AsymmetricWells(i, j));
                }
            }
        }
        if !(length_scale > 0.0 && cutoff >= length_scale) {
            return Err(ForceFieldError::BadLengthScales {
                cutoff,
                length_scale,
            });
        }

        Ok(Self {
            radii,
            wells,
            cutoff,
            length_scale,
            big_energy,
        })
    }

    /// The hard-coded default: a single atom type of radius 0.5 with a unit
    /// well.
    pub fn uniform_discs() -> Self {
        Self {
            radii: vec![0.5],
            wells: vec![vec![1.0]],
            cutoff: 2.5,
            length_scale: 1.0,
            big_energy: DEFAULT_BIG_ENERGY,
        }
    }

    pub fn load(path: &Path) -> Result<Self, ParamLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParamLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let raw: RawForceField = toml::from_str(&content).map_err(|e| ParamLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::new(
            raw.radii,
            raw.wells,
            raw.cutoff,
            raw.length_scale,
            raw.big_energy.unwrap_or(DEFAULT_BIG_ENERGY),
        )
        .map_err(|e| ParamLoadError::Invalid {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    pub fn n_atom_types(&self) -> usize {
        self.radii.len()
    }

    /// Hard radius of an atom type.
    pub fn size(&self, atom_type: usize) -> f64 {
        self.radii[atom_type]
    }

    /// Well depth between two atom types (symmetric).
    pub fn well(&self, type_a: usize, type_b: usize) -> f64 {
        self.wells[type_a][type_b]
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn length_scale(&self) -> f64 {
        self.length_scale
    }

    pub fn big_energy(&self) -> f64 {
        self.big_energy
    }

    /// Interaction energy between two atoms a centre distance `dist` apart.
    ///
    /// Below hard contact (the sum of the two radii) the energy is the big
    /// sentinel; at or beyond the cutoff it is zero; in between it is the
    /// flat-bottom cosine well scaled by the pair's well depth.
    pub fn pair_energy(&self, type_a: usize, type_b: usize, dist: f64) -> f64 {
        let contact = self.radii[type_a] + self.radii[type_b];
        if dist <= contact {
            return self.big_energy;
        }
        if dist >= self.cutoff {
            return 0.0;
        }
        potentials::flat_bottom_cosine_well(
            dist,
            contact,
            self.length_scale,
            self.cutoff,
            self.wells[type_a][type_b],
        )
    }
}

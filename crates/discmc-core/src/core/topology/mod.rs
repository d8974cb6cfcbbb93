use crate::core::forcefield::ForceField;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// An interaction site belonging to an object type: an atom type plus the
/// body-frame offset of its centre relative to the object centre at an
/// orientation of zero radians.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AtomSite {
    pub atom_type: usize,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ObjectTopology {
    pub atoms: Vec<AtomSite>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTopology {
    objects: Vec<ObjectTopology>,
}

/// Immutable map from object type to its fixed pattern of atoms.
///
/// The core is agnostic to how a topology is populated: the TOML loader and
/// the hard-coded [`Topology::uniform_discs`] default both satisfy the same
/// lookup contract.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    objects: Vec<ObjectTopology>,
}

impl Topology {
    pub fn new(objects: Vec<ObjectTopology>) -> Self {
        Self { objects }
    }

    /// The hard-coded default: one object type made of a single type-0 atom
    /// at the object centre.
    pub fn uniform_discs() -> Self {
        Self {
            objects: vec![ObjectTopology {
                atoms: vec![AtomSite {
                    atom_type: 0,
                    x: 0.0,
                    y: 0.0,
                }],
            }],
        }
    }

    pub fn load(path: &Path) -> Result<Self, TopologyLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| TopologyLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let raw: RawTopology = toml::from_str(&content).map_err(|e| TopologyLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Ok(Self::new(raw.objects))
    }

    pub fn n_object_types(&self) -> usize {
        self.objects.len()
    }

    pub fn n_atoms(&self, o_type: usize) -> usize {
        self.objects[o_type].atoms.len()
    }

    pub fn atom(&self, o_type: usize, index: usize) -> &AtomSite {
        &self.objects[o_type].atoms[index]
    }

    pub fn atoms(&self, o_type: usize) -> &[AtomSite] {
        &self.objects[o_type].atoms
    }

    /// Checks that every atom type referenced by the topology is known to
    /// the force field.
    pub fn validate_against(&self, forcefield: &ForceField) -> Result<(), TopologyLoadError> {
        for (o_type, object) in self.objects.iter().enumerate() {
            for atom in &object.atoms {
                if atom.atom_type >= forcefield.n_atom_types() {
                    return Err(TopologyLoadError::UnknownAtomType {
                        o_type,
                        atom_type: atom.atom_type,
                        n_atom_types: forcefield.n_atom_types(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Upper bound on the distance from an object centre to the far edge of
    /// any of its atoms. Twice this value plus the cutoff bounds the
    /// centre-to-centre distance at which two objects can still interact.
    pub fn interaction_reach(&self, forcefield: &ForceField) -> f64 {
        self.objects
            .iter()
            .flat_map(|object| &object.atoms)
            .map(|atom| (atom.x * atom.x + atom.y * atom.y).sqrt() + forcefield.size(atom.atom_type))
            .fold(0.0, f64::max)
    }
}

#[derive(Debug, Error)]
pub enum TopologyLoadError {
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

    #[error(
        "Object type {o_type} references atom type {atom_type}, but the force field only defines {n_atom_types}"
    )]
    UnknownAtomType {
        o_type: usize,
        atom_type: usize,
        n_atom_types: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_topology_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn loads_topology_successfully_and_lookup_works() {
        let content = r#"
[[objects]]
atoms = [
    { atom_type = 0, x = 0.0, y = 0.0 },
    { atom_type = 1, x = 0.7, y = 0.0 },
]

[[objects]]
atoms = [{ atom_type = 0, x = 0.0, y = 0.0 }]
"#;
        let file = create_test_topology_file(content);

        let topology = Topology::load(file.path()).unwrap();

        assert_eq!(topology.n_object_types(), 2);
        assert_eq!(topology.n_atoms(0), 2);
        assert_eq!(topology.n_atoms(1), 1);
        assert_eq!(topology.atom(0, 1).atom_type, 1);
        assert_eq!(topology.atom(0, 1).x, 0.7);
    }

    #[test]
    fn load_returns_io_error_for_nonexistent_file() {
        let result = Topology::load(Path::new("nonexistent_topology.toml"));
        assert!(matches!(result, Err(TopologyLoadError::Io { .. })));
    }

    #[test]
    fn load_returns_toml_error_for_malformed_file() {
        let file = create_test_topology_file("this is not valid toml");
        let result = Topology::load(file.path());
        assert!(matches!(result, Err(TopologyLoadError::Toml { .. })));
    }

    #[test]
    fn default_topology_is_a_single_centred_disc() {
        let topology = Topology::uniform_discs();
        assert_eq!(topology.n_object_types(), 1);
        assert_eq!(topology.n_atoms(0), 1);
        let site = topology.atom(0, 0);
        assert_eq!((site.atom_type, site.x, site.y), (0, 0.0, 0.0));
    }

    #[test]
    fn interaction_reach_covers_the_farthest_atom_edge() {
        let topology = Topology::new(vec![ObjectTopology {
            atoms: vec![
                AtomSite {
                    atom_type: 0,
                    x: 0.0,
                    y: 0.0,
                },
                AtomSite {
                    atom_type: 0,
                    x: 3.0,
                    y: 4.0,
                },
            ],
        }]);
        let ff = ForceField::uniform_discs();
        // |(3, 4)| = 5 plus the type-0 radius of 0.5.
        assert!((topology.interaction_reach(&ff) - 5.5).abs() < 1e-12);
    }

    #[test]
    fn validate_against_rejects_unknown_atom_types() {
        let topology = Topology::new(vec![ObjectTopology {
            atoms: vec![AtomSite {
                atom_type: 3,
                x: 0.0,
                y: 0.0,
            }],
        }]);
        let ff = ForceField::uniform_discs();
        assert!(matches!(
            topology.validate_against(&ff),
            Err(TopologyLoadError::UnknownAtomType {
                o_type: 0,
                atom_type: 3,
                ..
            })
        ));
    }

    #[test]
    fn validate_against_accepts_a_consistent_pair() {
        let topology = Topology::uniform_discs();
        let ff = ForceField::uniform_discs();
        assert!(topology.validate_against(&ff).is_ok());
    }
}

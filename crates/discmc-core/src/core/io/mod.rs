//! The persisted configuration format: a plain text header of domain
//! extents and object count followed by one `o_type x y theta` line per
//! object. Files written here read back byte-faithfully through
//! [`read_configuration`]. Periodicity is not part of the format; loading
//! assumes periodic boundaries.

use crate::core::models::{Configuration, Object};
use crate::core::models::configuration::ConfigurationError;
use crate::core::topology::Topology;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigReadError {
    #[error("I/O error while reading configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: expected {expected}, got '{content}'")]
    Malformed {
        line: usize,
        expected: &'static str,
        content: String,
    },

    #[error("Expected {expected} objects but the file holds {found}")]
    ObjectCount { expected: usize, found: usize },

    #[error("Line {line}: object type {o_type} is not defined by the topology ({n_types} types)")]
    UnknownObjectType {
        line: usize,
        o_type: usize,
        n_types: usize,
    },

    #[error(transparent)]
    Domain(#[from] ConfigurationError),
}

/// Reads a configuration, binding it to `topology`. Object types are
/// validated against the topology and centres are wrapped into the
/// (periodic) domain.
pub fn read_configuration<R: BufRead>(
    reader: R,
    topology: Topology,
) -> Result<Configuration, ConfigReadError> {
    let mut lines = reader.lines().enumerate();

    let (line, content) = next_content_line(&mut lines)?.ok_or(ConfigReadError::Malformed {
        line: 1,
        expected: "domain extents 'Lx Ly'",
        content: String::new(),
    })?;
    let extents = parse_fields::<f64>(&content, 2, line, "domain extents 'Lx Ly'")?;
    let (x_size, y_size) = (extents[0], extents[1]);

    let (line, content) = next_content_line(&mut lines)?.ok_or(ConfigReadError::Malformed {
        line: 2,
        expected: "object count",
        content: String::new(),
    })?;
    let n_objects = content
        .trim()
        .parse::<usize>()
        .map_err(|_| ConfigReadError::Malformed {
            line,
            expected: "object count",
            content: content.clone(),
        })?;

    let mut config = Configuration::new(x_size, y_size, topology)?;

    let mut found = 0usize;
    while let Some((line, content)) = next_content_line(&mut lines)? {
        if found == n_objects {
            return Err(ConfigReadError::ObjectCount {
                expected: n_objects,
                found: found + 1,
            });
        }
        let fields: Vec<&str> = content.split_whitespace().collect();
        if fields.len() != 4 {
            return Err(ConfigReadError::Malformed {
                line,
                expected: "object line 'o_type x y theta'",
                content,
            });
        }
        let o_type = fields[0]
            .parse::<usize>()
            .map_err(|_| ConfigReadError::Malformed {
                line,
                expected: "object type index",
                content: content.clone(),
            })?;
        if o_type >= config.topology().n_object_types() {
            return Err(ConfigReadError::UnknownObjectType {
                line,
                o_type,
                n_types: config.topology().n_object_types(),
            });
        }
        let mut reals = [0.0f64; 3];
        for (slot, field) in reals.iter_mut().zip(&fields[1..]) {
            *slot = field.parse().map_err(|_| ConfigReadError::Malformed {
                line,
                expected: "object line 'o_type x y theta'",
                content: content.clone(),
            })?;
        }
        config.add_object(Object::new(
            o_type,
            reals[0].rem_euclid(x_size),
            reals[1].rem_euclid(y_size),
            reals[2],
        ));
        found += 1;
    }

    if found != n_objects {
        return Err(ConfigReadError::ObjectCount {
            expected: n_objects,
            found,
        });
    }

    Ok(config)
}

pub fn read_from_path(path: &Path, topology: Topology) -> Result<Configuration, ConfigReadError> {
    let file = std::fs::File::open(path)?;
    read_configuration(BufReader::new(file), topology)
}

/// Writes a configuration in the format read by [`read_configuration`].
pub fn write_configuration<W: Write>(
    config: &Configuration,
    mut writer: W,
) -> std::io::Result<()> {
    writeln!(writer, "{:.6} {:.6}", config.x_size(), config.y_size())?;
    writeln!(writer, "{}", config.n_objects())?;
    for object in config.objects() {
        let p = object.position();
        writeln!(
            writer,
            "{} {:.6} {:.6} {:.6}",
            object.o_type(),
            p.x,
            p.y,
            object.orientation()
        )?;
    }
    Ok(())
}

pub fn write_to_path(config: &Configuration, path: &Path) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_configuration(config, &mut file)?;
    file.flush()
}

fn next_content_line<I>(lines: &mut I) -> Result<Option<(usize, String)>, ConfigReadError>
where
    I: Iterator<Item = (usize, std::io::Result<String>)>,
{
    for (index, line) in lines {
        let line = line?;
        if !line.trim().is_empty() {
            return Ok(Some((index + 1, line)));
        }
    }
    Ok(None)
}

fn parse_fields<T: std::str::FromStr>(
    content: &str,
    count: usize,
    line: usize,
    expected: &'static str,
) -> Result<Vec<T>, ConfigReadError> {
    let fields: Vec<&str> = content.split_whitespace().collect();
    if fields.len() != count {
        return Err(ConfigReadError::Malformed {
            line,
            expected,
            content: content.to_string(),
        });
    }
    fields
        .iter()
        .map(|f| {
            f.parse().map_err(|_| ConfigReadError::Malformed {
                line,
                expected,
                content: content.to_string(),
            })
        })
        .collect()
}

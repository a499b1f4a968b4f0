//! Grid header of a Tiled `.tmx` map.
//!
//! Only the `<map>` element is read; layers, tilesets and objects are left to
//! whatever consumes the tile data.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use roxmltree::{Document, Node};
use thiserror::Error;
use tracing::debug;

use super::{GridError, TileGridSpec};

#[derive(Debug, Error)]
pub enum TmxError {
    #[error("malformed XML at {line}:{column}: {message}")]
    Malformed {
        line: u32,
        column: u32,
        message: String,
    },
    #[error("root element must be <map>, found <{found}>")]
    InvalidRoot { found: String },
    #[error("missing attribute `{name}` on <map> at {line}:{column}")]
    MissingAttribute {
        name: &'static str,
        line: u32,
        column: u32,
    },
    #[error("attribute `{name}` has invalid value {value:?}")]
    InvalidAttribute { name: &'static str, value: String },
    #[error("unsupported map orientation {found:?}; expected staggered or isometric")]
    UnsupportedOrientation { found: String },
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

const SUPPORTED_ORIENTATIONS: [&str; 2] = ["staggered", "isometric"];

impl TileGridSpec {
    pub fn from_tmx_str(raw: &str) -> Result<Self, TmxError> {
        let doc = Document::parse(raw).map_err(|error| TmxError::Malformed {
            line: error.pos().row,
            column: error.pos().col,
            message: error.to_string(),
        })?;

        let map = doc.root_element();
        if map.tag_name().name() != "map" {
            return Err(TmxError::InvalidRoot {
                found: map.tag_name().name().to_string(),
            });
        }

        let orientation = required_attribute(&doc, map, "orientation")?;
        if !SUPPORTED_ORIENTATIONS.contains(&orientation) {
            return Err(TmxError::UnsupportedOrientation {
                found: orientation.to_string(),
            });
        }

        let columns: u32 = parse_attribute(&doc, map, "width")?;
        let rows: u32 = parse_attribute(&doc, map, "height")?;
        let tile_width: i32 = parse_attribute(&doc, map, "tilewidth")?;
        let tile_height: i32 = parse_attribute(&doc, map, "tileheight")?;

        let grid = TileGridSpec::new(tile_width, tile_height, columns, rows)?;
        debug!(
            orientation,
            columns, rows, tile_width, tile_height, "tmx_header_parsed"
        );
        Ok(grid)
    }
}

pub fn load_tmx_file(path: &Path) -> Result<TileGridSpec, TmxError> {
    let raw = fs::read_to_string(path).map_err(|source| TmxError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    TileGridSpec::from_tmx_str(&raw)
}

fn required_attribute<'a>(
    doc: &Document<'_>,
    node: Node<'a, '_>,
    name: &'static str,
) -> Result<&'a str, TmxError> {
    node.attribute(name).ok_or_else(|| {
        let pos = doc.text_pos_at(node.range().start);
        TmxError::MissingAttribute {
            name,
            line: pos.row,
            column: pos.col,
        }
    })
}

fn parse_attribute<T: FromStr>(
    doc: &Document<'_>,
    node: Node<'_, '_>,
    name: &'static str,
) -> Result<T, TmxError> {
    let raw = required_attribute(doc, node, name)?;
    raw.trim()
        .parse::<T>()
        .map_err(|_| TmxError::InvalidAttribute {
            name,
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMO_MAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.10" orientation="staggered" renderorder="right-down" width="20" height="40" tilewidth="64" tileheight="32" staggeraxis="y" staggerindex="odd">
 <tileset firstgid="1" source="ground.tsx"/>
</map>
"#;

    #[test]
    fn parses_staggered_header() {
        let grid = TileGridSpec::from_tmx_str(DEMO_MAP).expect("grid");
        assert_eq!(grid, TileGridSpec::new(64, 32, 20, 40).expect("grid"));
    }

    #[test]
    fn accepts_isometric_orientation() {
        let raw = r#"<map orientation="isometric" width="4" height="4" tilewidth="32" tileheight="16"/>"#;
        let grid = TileGridSpec::from_tmx_str(raw).expect("grid");
        assert_eq!((grid.columns(), grid.tile_height()), (4, 16));
    }

    #[test]
    fn malformed_xml_reports_position() {
        let err = TileGridSpec::from_tmx_str("<map>\n  <layer>\n</map>").expect_err("err");
        match err {
            TmxError::Malformed { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_wrong_root() {
        let err = TileGridSpec::from_tmx_str("<tileset name=\"ground\"/>").expect_err("err");
        assert!(matches!(err, TmxError::InvalidRoot { found } if found == "tileset"));
    }

    #[test]
    fn missing_attribute_points_at_map_element() {
        let raw = "<?xml version=\"1.0\"?>\n<map orientation=\"staggered\" width=\"2\" height=\"2\" tilewidth=\"64\"/>";
        let err = TileGridSpec::from_tmx_str(raw).expect_err("err");
        match err {
            TmxError::MissingAttribute { name, line, column } => {
                assert_eq!(name, "tileheight");
                assert_eq!((line, column), (2, 1));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_non_numeric_and_unsupported_values() {
        let raw = r#"<map orientation="staggered" width="ten" height="2" tilewidth="64" tileheight="32"/>"#;
        let err = TileGridSpec::from_tmx_str(raw).expect_err("err");
        assert!(matches!(err, TmxError::InvalidAttribute { name: "width", .. }));

        let raw = r#"<map orientation="orthogonal" width="2" height="2" tilewidth="64" tileheight="32"/>"#;
        let err = TileGridSpec::from_tmx_str(raw).expect_err("err");
        assert!(matches!(err, TmxError::UnsupportedOrientation { .. }));
    }

    #[test]
    fn grid_validation_errors_pass_through() {
        let raw = r#"<map orientation="staggered" width="0" height="2" tilewidth="64" tileheight="32"/>"#;
        let err = TileGridSpec::from_tmx_str(raw).expect_err("err");
        assert!(matches!(
            err,
            TmxError::Grid(GridError::EmptyGrid { columns: 0, rows: 2 })
        ));
    }

    #[test]
    fn load_tmx_file_reads_from_disk() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("demo.tmx");
        fs::write(&path, DEMO_MAP).expect("write");

        let grid = load_tmx_file(&path).expect("load");
        assert_eq!(grid.rows(), 40);

        let missing = temp.path().join("missing.tmx");
        let err = load_tmx_file(&missing).expect_err("err");
        assert!(matches!(err, TmxError::Io { path, .. } if path == missing));
    }
}

//! Resolution pipeline: reads content files, resolves descriptor names, and
//! builds the catalog and family an engine runs on.
//!
//! A content directory holds up to three files:
//!
//! - `descriptors` -- a list of path descriptors
//! - `family` -- the block family; shapes name descriptors from the list
//! - `config` -- an [`EngineConfig`]; every field is optional
//!
//! Without a `family` file the standard pipe family is used and
//! `descriptors` is ignored.

use crate::loader::{
    DataLoadError, check_duplicate, deserialize_file, deserialize_list, find_data_file,
    require_data_file, resolve_name,
};
use crate::schema::{DescriptorData, FamilyData};
use conduit_core::config::EngineConfig;
use conduit_core::engine::Engine;
use conduit_core::family::{ConduitFamily, ConduitFamilyBuilder};
use conduit_core::id::DescriptorId;
use conduit_core::physics::FreeBodyStore;
use conduit_core::segment::SegmentCatalog;
use conduit_core::storage::ContainerStore;
use std::collections::HashMap;
use std::path::Path;

/// Loaded and validated content.
#[derive(Debug)]
pub struct Content {
    pub catalog: SegmentCatalog,
    pub family: ConduitFamily,
    pub config: EngineConfig,
}

impl Content {
    /// Build an engine with in-process physics and storage.
    pub fn into_engine(self) -> Result<Engine, DataLoadError> {
        Ok(Engine::with_parts(
            self.config,
            self.catalog,
            self.family,
            FreeBodyStore::new(),
            ContainerStore::new(),
        )?)
    }
}

/// Load everything in `dir`.
pub fn load_content(dir: &Path) -> Result<Content, DataLoadError> {
    let config = match find_data_file(dir, "config")? {
        Some(path) => load_config(&path)?,
        None => EngineConfig::default(),
    };

    let mut catalog = SegmentCatalog::new();
    let family = match find_data_file(dir, "family")? {
        Some(family_path) => {
            let descriptors_path = require_data_file(dir, "descriptors")?;
            let descriptors: Vec<DescriptorData> =
                deserialize_list(&descriptors_path, "descriptors")?;
            let family: FamilyData = deserialize_file(&family_path)?;
            build_family(&mut catalog, descriptors, &family, &descriptors_path, &family_path)?
        }
        None => ConduitFamily::standard(&mut catalog)?,
    };

    log::info!(
        "loaded content from {}: family '{}', {} shapes, {} descriptors",
        dir.display(),
        family.name(),
        family.shape_count(),
        catalog.len()
    );
    Ok(Content {
        catalog,
        family,
        config,
    })
}

/// Read and validate an engine config file.
pub fn load_config(path: &Path) -> Result<EngineConfig, DataLoadError> {
    let config: EngineConfig = deserialize_file(path)?;
    config.validate()?;
    Ok(config)
}

/// Register `descriptors` and build `family` against them.
///
/// Descriptor names must be unique, and every name a shape lists must be
/// defined. The built family is checked for totality over all masks.
pub fn build_family(
    catalog: &mut SegmentCatalog,
    descriptors: Vec<DescriptorData>,
    family: &FamilyData,
    descriptors_file: &Path,
    family_file: &Path,
) -> Result<ConduitFamily, DataLoadError> {
    let mut ids: HashMap<String, DescriptorId> = HashMap::new();
    for descriptor in descriptors {
        check_duplicate(&ids, &descriptor.name, descriptors_file)?;
        let name = descriptor.name.clone();
        ids.insert(name, catalog.register(descriptor));
    }

    let mut builder = ConduitFamilyBuilder::new(&family.name);
    for shape in &family.shapes {
        let resolved = shape
            .descriptors
            .iter()
            .map(|name| resolve_name(&ids, name, family_file, "descriptor").copied())
            .collect::<Result<Vec<_>, _>>()?;
        builder.register_shape(&shape.name, &shape.sides, resolved)?;
    }
    Ok(builder.build(catalog)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{Format, parse_list, parse_str};
    use conduit_core::family::ResolverError;
    use conduit_core::side::ConnectionMask;
    use std::fs;
    use std::path::PathBuf;

    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "conduit_data_content_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    const DESCRIPTORS: &str = r#"[
        {"name": "north_south", "first": {"side": "North"}, "second": {"side": "South"}},
        {"name": "all_faces", "first": {"side": "Up"}, "second": {"side": "Down"}}
    ]"#;

    #[test]
    fn empty_dir_uses_standard_family() {
        let dir = make_test_dir("empty");
        let content = load_content(&dir).unwrap();
        assert_eq!(content.family.name(), "pipe");
        assert_eq!(content.family.shape_count(), 10);
        assert_eq!(content.config, EngineConfig::default());
        cleanup(&dir);
    }

    #[test]
    fn config_file_is_validated() {
        let dir = make_test_dir("config");
        fs::write(dir.join("config.toml"), "tick_rate = 0\n").unwrap();
        assert!(matches!(
            load_content(&dir),
            Err(DataLoadError::Config(_))
        ));
        fs::write(dir.join("config.toml"), "tick_rate = 20\nseed = 4\n").unwrap();
        let content = load_content(&dir).unwrap();
        assert_eq!(content.config.tick_rate, 20);
        assert_eq!(content.config.seed, 4);
        cleanup(&dir);
    }

    #[test]
    fn family_requires_descriptors() {
        let dir = make_test_dir("no_descriptors");
        fs::write(dir.join("family.json"), r#"{"name": "x", "shapes": []}"#).unwrap();
        assert!(matches!(
            load_content(&dir),
            Err(DataLoadError::MissingRequired { .. })
        ));
        cleanup(&dir);
    }

    #[test]
    fn unknown_descriptor_name() {
        let origin = Path::new("inline");
        let descriptors = parse_list(DESCRIPTORS, Format::Json, origin, "descriptors").unwrap();
        let family: FamilyData = parse_str(
            r#"{"name": "x", "shapes": [{"name": "a", "descriptors": ["missing"]}]}"#,
            Format::Json,
            origin,
        )
        .unwrap();
        let err = build_family(&mut SegmentCatalog::new(), descriptors, &family, origin, origin)
            .unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::UnresolvedRef { ref name, .. } if name == "missing"
        ));
    }

    #[test]
    fn duplicate_descriptor_name() {
        let origin = Path::new("inline");
        let mut descriptors: Vec<DescriptorData> =
            parse_list(DESCRIPTORS, Format::Json, origin, "descriptors").unwrap();
        descriptors.push(descriptors[0].clone());
        let family = FamilyData {
            name: "x".into(),
            shapes: Vec::new(),
        };
        assert!(matches!(
            build_family(&mut SegmentCatalog::new(), descriptors, &family, origin, origin),
            Err(DataLoadError::DuplicateName { .. })
        ));
    }

    #[test]
    fn partial_family_is_rejected() {
        let origin = Path::new("inline");
        let descriptors = parse_list(DESCRIPTORS, Format::Json, origin, "descriptors").unwrap();
        let family: FamilyData = parse_str(
            r#"
name = "partial"

[[shapes]]
name = "all"
sides = ["Up", "Down", "North", "South", "East", "West"]
descriptors = ["north_south", "all_faces"]
"#,
            Format::Toml,
            origin,
        )
        .unwrap();
        let err = build_family(&mut SegmentCatalog::new(), descriptors, &family, origin, origin)
            .unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::Resolver(ResolverError::UnresolvedMask(m)) if m != ConnectionMask::ALL.bits()
        ));
    }
}

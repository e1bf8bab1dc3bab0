use super::merge::builder_with_defaults;
use super::sources::{environment, global_file, workspace_file};
use super::QuillConfig;
use config::{ConfigError, File};
use std::path::{Path, PathBuf};

/// Builds a [`QuillConfig`] from its layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load defaults, the global file, `<workspace_root>/quill.toml`, then
    /// the environment.
    pub fn load(workspace_root: &Path) -> Result<QuillConfig, ConfigError> {
        Self::load_layers(global_file::global_config_path(), workspace_root)
    }

    /// Same as [`ConfigLoader::load`] with an explicit global file path.
    pub fn load_layers(
        global_path: Option<PathBuf>,
        workspace_root: &Path,
    ) -> Result<QuillConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder, global_path)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }

    /// Load a single file over the defaults. The file must exist.
    pub fn load_from_file(path: &Path) -> Result<QuillConfig, ConfigError> {
        builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true))
            .build()?
            .try_deserialize()
    }
}

pub mod config;
pub mod error;
pub mod ini;
pub mod local_conf;
pub mod output;
pub mod rewrite;
pub mod scanner;

pub use config::{
    find_config_file, generate_init_file, load_config, merge_settings, CliOptions, ConfigError,
    DsconfToml, Settings, DSCONF_TOML_TEMPLATE,
};
pub use error::{EditError, Result};
pub use ini::IniFile;
pub use local_conf::{LocalConf, LOCAL_CONF, LOCAL_GROUP};
pub use output::{print_change, should_use_colors, FileChange, OutputContext, OutputMode};
pub use rewrite::WriteMode;

use std::path::{Path, PathBuf};

/// One edit requested from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    IniSet {
        inifile: PathBuf,
        section: String,
        name: String,
        value: String,
    },
    IniComment {
        inifile: PathBuf,
        section: String,
        name: String,
    },
    IniUncomment {
        inifile: PathBuf,
        section: String,
        name: String,
    },
    IniRemove {
        inifile: PathBuf,
        section: String,
        name: String,
    },
    ExtractLocalrc {
        local_conf: PathBuf,
        local_rc: PathBuf,
    },
    Extract {
        local_conf: PathBuf,
        group: String,
        conf: String,
        target: PathBuf,
    },
    SetLocal {
        local_conf: PathBuf,
        line: String,
    },
    SetConf {
        local_conf: PathBuf,
        group: String,
        conf: String,
        section: String,
        name: String,
        value: String,
    },
    Merge {
        local_conf: PathBuf,
        sources: Vec<PathBuf>,
    },
}

impl Action {
    /// The file this action writes to.
    pub fn target(&self) -> &Path {
        match self {
            Action::IniSet { inifile, .. }
            | Action::IniComment { inifile, .. }
            | Action::IniUncomment { inifile, .. }
            | Action::IniRemove { inifile, .. } => inifile,
            Action::ExtractLocalrc { local_rc, .. } => local_rc,
            Action::Extract { target, .. } => target,
            Action::SetLocal { local_conf, .. }
            | Action::SetConf { local_conf, .. }
            | Action::Merge { local_conf, .. } => local_conf,
        }
    }

    /// Run the action, writing with `mode`.
    pub fn apply(&self, mode: WriteMode) -> Result<()> {
        match self {
            Action::IniSet {
                inifile,
                section,
                name,
                value,
            } => ini_file(inifile, mode).set(section, name, value),
            Action::IniComment {
                inifile,
                section,
                name,
            } => ini_file(inifile, mode).comment(section, name),
            Action::IniUncomment {
                inifile,
                section,
                name,
            } => ini_file(inifile, mode).uncomment(section, name),
            Action::IniRemove {
                inifile,
                section,
                name,
            } => ini_file(inifile, mode).remove(section, name),
            Action::ExtractLocalrc {
                local_conf,
                local_rc,
            } => local(local_conf, mode).extract_localrc(local_rc),
            Action::Extract {
                local_conf,
                group,
                conf,
                target,
            } => local(local_conf, mode).extract(group, conf, target),
            Action::SetLocal { local_conf, line } => local(local_conf, mode).set_local(line),
            Action::SetConf {
                local_conf,
                group,
                conf,
                section,
                name,
                value,
            } => local(local_conf, mode).set(group, conf, section, name, value),
            Action::Merge {
                local_conf,
                sources,
            } => {
                let lc = local(local_conf, mode);
                sources.iter().try_for_each(|source| lc.merge_lc(source))
            }
        }
    }
}

fn ini_file(path: &Path, mode: WriteMode) -> IniFile {
    IniFile::new(path).with_write_mode(mode)
}

fn local(path: &Path, mode: WriteMode) -> LocalConf {
    LocalConf::new(path).with_write_mode(mode)
}

/// Main entry point: apply `action` and report what changed.
pub fn run(action: &Action, settings: &Settings, ctx: &OutputContext) -> Result<FileChange> {
    let target = action.target();
    let existed = target.exists();
    let before = rewrite::read_or_empty(target)?;

    tracing::debug!(?action, mode = ?settings.write_mode, "running action");
    action.apply(settings.write_mode)?;

    let after = rewrite::read_or_empty(target)?;
    let change = FileChange {
        before,
        after,
        created: !existed && target.exists(),
    };
    output::print_change(target, &change, ctx);
    Ok(change)
}

use nanoserde::DeJson;
use std::path::PathBuf;

/// Environment variable holding the [`DebugMask`]
pub const DEBUG_ENV: &str = "CASTMM_DEBUG";

/// Which debug prints are enabled, read from `CASTMM_DEBUG`.
///
/// Bit 0 prints device and backend selection, bit 1 timings,
/// bit 2 kernel sources and build options.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DebugMask(pub u32);

impl DebugMask {
    /// Read mask from the environment, unset or invalid means no debug prints
    pub fn from_env() -> DebugMask {
        std::env::var(DEBUG_ENV)
            .ok()
            .and_then(|x| x.parse::<u32>().ok())
            .map_or(DebugMask(0), DebugMask)
    }

    /// Print device and config information
    pub const fn dev(self) -> bool {
        self.0 % 2 == 1
    }

    /// Print timings
    pub const fn perf(self) -> bool {
        (self.0 >> 1) % 2 == 1
    }

    /// Print kernel sources
    pub const fn kernel(self) -> bool {
        (self.0 >> 2) % 2 == 1
    }
}

/// Paths searched for `castmm/{file_name}`, system config dirs first, then config home
pub fn config_paths(file_name: &str) -> Vec<PathBuf> {
    let Ok(bd) = xdg::BaseDirectories::new() else {
        return Vec::new();
    };
    let mut dirs = bd.get_config_dirs();
    dirs.push(bd.get_config_home());
    dirs.into_iter()
        .map(|mut path| {
            path.push("castmm");
            path.push(file_name);
            path
        })
        .collect()
}

/// Search through config directories and parse the first readable `castmm/{file_name}`.
/// If not found or failed to parse, use defaults.
pub fn load_config<T: DeJson + Default>(file_name: &str, debug: DebugMask) -> T {
    let paths = config_paths(file_name);
    if paths.is_empty() && debug.dev() {
        println!("Failed to find config directories for {file_name}");
    }
    paths
        .into_iter()
        .find_map(|path| {
            std::fs::read_to_string(&path)
                .map_err(|e| {
                    if debug.dev() {
                        println!("Failed to read {file_name} at {path:?}, {e}");
                    }
                })
                .ok()
        })
        .and_then(|file| parse_config(&file, debug))
        .unwrap_or_else(|| {
            if debug.dev() {
                println!("Failed to get {file_name}, using defaults.");
            }
            T::default()
        })
}

/// Parse config file contents
pub fn parse_config<T: DeJson>(file: &str, debug: DebugMask) -> Option<T> {
    match T::deserialize_json(file) {
        Ok(config) => {
            if debug.dev() {
                println!("Config successfully read and parsed.");
            }
            Some(config)
        }
        Err(e) => {
            if debug.dev() {
                println!("Failed to parse config, {e}");
            }
            None
        }
    }
}

/// Build metadata baked in by `build.rs`
#[derive(Debug, Clone, Copy)]
pub struct BuildInfo {
    pub version: &'static str,
    pub repo_version: &'static str,
    pub build_profile: &'static str,
    pub build_timestamp: &'static str,
    pub rust_version: &'static str,
    pub build_target: Option<&'static str>,
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        repo_version: env!("REPO_VERSION"),
        build_profile: env!("BUILD_PROFILE"),
        build_timestamp: env!("BUILD_TIMESTAMP"),
        rust_version: env!("RUST_VERSION"),
        build_target: option_env!("BUILD_TARGET"),
    }
}

impl std::fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "sealpoint {} ({})", self.version, self.repo_version)?;
        writeln!(f, "profile: {}", self.build_profile)?;
        writeln!(f, "built: {}", self.build_timestamp)?;
        write!(f, "rustc: {}", self.rust_version)?;
        if let Some(target) = self.build_target {
            write!(f, "\ntarget: {}", target)?;
        }
        Ok(())
    }
}

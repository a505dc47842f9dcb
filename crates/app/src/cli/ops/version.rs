use std::convert::Infallible;

use clap::Args;

use crate::cli::op::{Op, OpContext};
use crate::version::build_info;

#[derive(Args, Debug, Clone)]
pub struct Version {
    /// Print only the package version
    #[arg(long)]
    pub short: bool,
}

#[async_trait::async_trait]
impl Op for Version {
    type Error = Infallible;
    type Output = String;

    async fn execute(&self, _ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let build = build_info();
        if self.short {
            return Ok(build.version.to_string());
        }
        Ok(build.to_string())
    }
}

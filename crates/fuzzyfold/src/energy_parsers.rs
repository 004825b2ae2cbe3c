use std::path::PathBuf;
use clap::Args;
use clap::ValueEnum;
use anyhow::Result;

use ff_energy::{MblModel, TurnerModel};

/// Which multibranch-loop energy model to use, mirrors `ff_energy::MblModel`.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum MblModelArg {
    Classic,
    Asymmetry,
}

impl From<MblModelArg> for MblModel {
    fn from(arg: MblModelArg) -> Self {
        match arg {
            MblModelArg::Classic => MblModel::Classic,
            MblModelArg::Asymmetry => MblModel::Asymmetry,
        }
    }
}

/// Free energy evaluation parameters.
#[derive(Debug, Args)]
pub struct EnergyModelArguments {
    /// Temperature in Celsius
    #[arg(short, long, default_value = "37.0")]
    pub temperature: f64,

    /// Parameter file (e.g. rna_turner2004.par)
    #[arg(short, long, value_name = "FILE")]
    pub model_parameters: Option<PathBuf>,

    /// Multi-branch loop energy model.
    #[arg(long, value_enum, default_value_t = MblModelArg::Classic)]
    pub mbl_model: MblModelArg,
}

impl EnergyModelArguments {
    /// Return the parameter file path, falling back to crate-relative default.
    pub fn param_file(&self) -> PathBuf {
        self.model_parameters.clone().unwrap_or_else(|| {
            PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/params/rna_turner2004.par"))
        })
    }

    /// Build the nearest-neighbor energy model from these arguments.
    pub fn build_model(&self) -> Result<TurnerModel> {
        let model = match &self.model_parameters {
            Some(path) => TurnerModel::from_parameter_file(path, self.mbl_model.into())?,
            None => TurnerModel::from_str(
                ff_energy::parameters::DEFAULT_PARAMETER_FILE,
                self.mbl_model.into(),
            )?,
        };
        Ok(model.with_temperature(self.temperature))
    }
}

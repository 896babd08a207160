use std::fmt::Write as _;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::controller::{ControllerError, DeleteRequest, ScenarioController};
use crate::core::{
    ContributionFrequency, InvestmentInputs, Projection, ValidationError, validate_inputs,
};
use crate::store::{DefaultStoreFactory, FileStorage, Identity, Scenario};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliFrequency {
    Monthly,
    Annual,
}

impl From<CliFrequency> for ContributionFrequency {
    fn from(value: CliFrequency) -> Self {
        match value {
            CliFrequency::Monthly => ContributionFrequency::Monthly,
            CliFrequency::Annual => ContributionFrequency::Annual,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "nestegg",
    about = "Compound growth projections with saved scenarios"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "NESTEGG_DATA_DIR",
        default_value = ".nestegg",
        help = "Directory for locally saved scenarios"
    )]
    pub data_dir: PathBuf,
    #[arg(
        long,
        global = true,
        env = "NESTEGG_SERVER_URL",
        help = "Scenario service base URL; used when signed in"
    )]
    pub server_url: Option<String>,
    #[arg(
        long,
        global = true,
        env = "NESTEGG_IDENTITY",
        help = "Signed-in account id; omit to work as a guest"
    )]
    pub identity: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the scenario HTTP API.
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        bind: IpAddr,
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Print a year-by-year projection.
    Project(InputArgs),
    #[command(subcommand)]
    Scenarios(ScenarioCommand),
}

#[derive(Subcommand, Debug)]
pub enum ScenarioCommand {
    List,
    Save {
        name: String,
        #[command(flatten)]
        inputs: InputArgs,
    },
    /// Load a saved scenario and print its projection.
    Load { id: String },
    Delete {
        id: String,
        #[arg(long, help = "Confirm the deletion")]
        yes: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    #[arg(long, default_value_t = 10_000.0)]
    pub starting_amount: f64,
    #[arg(long, default_value_t = 500.0)]
    pub contribution_amount: f64,
    #[arg(long, value_enum, default_value_t = CliFrequency::Monthly)]
    pub contribution_frequency: CliFrequency,
    #[arg(
        long,
        default_value_t = 8.0,
        allow_negative_numbers = true,
        help = "Expected annual growth in percent, e.g. 8"
    )]
    pub annual_growth_rate: f64,
    #[arg(
        long,
        default_value_t = 2.5,
        allow_negative_numbers = true,
        help = "Expected annual inflation in percent"
    )]
    pub inflation_rate: f64,
    #[arg(long, default_value_t = 20)]
    pub years_to_grow: i32,
}

pub fn build_inputs(args: InputArgs) -> Result<InvestmentInputs, ValidationError> {
    let inputs = InvestmentInputs {
        starting_amount: args.starting_amount,
        contribution_amount: args.contribution_amount,
        contribution_frequency: args.contribution_frequency.into(),
        annual_growth_rate: args.annual_growth_rate,
        inflation_rate: args.inflation_rate,
        years_to_grow: args.years_to_grow,
    };
    validate_inputs(&inputs)?;
    Ok(inputs)
}

pub async fn run_scenario_command(cli: &Cli, command: &ScenarioCommand) -> anyhow::Result<()> {
    let storage = Arc::new(FileStorage::new(&cli.data_dir));
    let factory = Arc::new(DefaultStoreFactory::new(storage, cli.server_url.clone()));
    let controller = ScenarioController::new(factory, InvestmentInputs::default());

    let identity = cli.identity.clone().map(Identity::new);
    if let Err(e) = controller.set_identity(identity).await {
        match e {
            // The list stays empty; saving may still work.
            ControllerError::Load(_) if matches!(command, ScenarioCommand::Save { .. }) => {
                eprintln!("warning: {e}");
            }
            e => return Err(anyhow::Error::new(e).context("could not load saved scenarios")),
        }
    }

    match command {
        ScenarioCommand::List => {
            print!("{}", render_scenarios(&controller.view().scenarios));
        }
        ScenarioCommand::Save { name, inputs } => {
            controller.set_inputs(build_inputs(inputs.clone())?);
            let scenario = controller.save(name).await?;
            println!("Saved \"{}\" as {}", scenario.name, scenario.id);
        }
        ScenarioCommand::Load { id } => {
            if !controller.load_into_inputs(id)? {
                bail!("no saved scenario with id {id}");
            }
            print!("{}", render_projection(&controller.summary()));
        }
        ScenarioCommand::Delete { id, yes } => {
            if !yes {
                bail!("refusing to delete {id} without --yes");
            }
            controller.delete(DeleteRequest::confirmed(id.clone())).await?;
            println!("Deleted {id}");
        }
    }
    Ok(())
}

pub fn render_projection(projection: &Projection) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4} {:>14} {:>14} {:>16} {:>16} {:>16}",
        "Year", "Contribution", "Growth", "Balance", "Contributed", "Real balance"
    );
    let _ = writeln!(out, "{}", "-".repeat(85));
    for row in &projection.rows {
        let _ = writeln!(
            out,
            "{:>4} {:>14.2} {:>14.2} {:>16.2} {:>16.2} {:>16.2}",
            row.year,
            row.contribution,
            row.growth,
            row.balance,
            row.total_contributions,
            row.real_balance
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Final balance:        {:.2}", projection.final_balance);
    let _ = writeln!(out, "Final real balance:   {:.2}", projection.final_real_balance);
    let _ = writeln!(out, "Total contributions:  {:.2}", projection.total_contributions);
    let _ = writeln!(out, "Total growth:         {:.2}", projection.total_growth);
    out
}

pub fn render_scenarios(scenarios: &[Scenario]) -> String {
    if scenarios.is_empty() {
        return "No saved scenarios\n".to_string();
    }
    let mut out = String::new();
    for scenario in scenarios {
        let _ = writeln!(
            out,
            "{}  {}  {}  ({} years)",
            scenario.id,
            scenario.created_at.format("%Y-%m-%d %H:%M"),
            scenario.name,
            scenario.inputs.years_to_grow
        );
    }
    out
}

use clap::{Parser, Subcommand};

use crate::commands::{create_user::CreateUserCmd, seed_spots::SeedSpotsCmd};

#[derive(Parser)]
#[command(
    version,
    about,
    long_about = "CLI for snapspot - provides commands to manage users and seed the spot database."
)]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    CreateUser(CreateUserCmd),
    SeedSpots(SeedSpotsCmd),
}

impl crate::commands::Executor for Command {
    async fn run(self) -> anyhow::Result<()> {
        match self {
            Command::CreateUser(cmd) => cmd.run().await,
            Command::SeedSpots(cmd) => cmd.run().await,
        }
    }
}

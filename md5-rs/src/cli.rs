//! Root CLI structure for md5-rs

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "md5-rs")]
#[command(about = "Inspect, validate and pose MD5 skeletal models", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Skeletal mesh (.md5mesh) operations
    Mesh {
        #[command(subcommand)]
        command: crate::commands::mesh::MeshCommands,
    },

    /// Animation (.md5anim) operations
    Anim {
        #[command(subcommand)]
        command: crate::commands::anim::AnimCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

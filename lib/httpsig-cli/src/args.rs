use clap::{Args, Parser, Subcommand};

#[derive(Args)]
pub struct ParseHeaderArgs {
    /// The `Signature …` header to parse
    pub header: String,
}

#[derive(Subcommand)]
pub enum ToolSubcommand {
    /// Parse an HTTP Signature header and report any format errors
    ParseHeader(ParseHeaderArgs),
}

#[derive(Parser)]
#[command(about, version)]
pub struct ToolArgs {
    #[clap(subcommand)]
    pub subcommand: ToolSubcommand,
}

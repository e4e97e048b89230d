//! Clap derive structures for the `flowsync` CLI.
//!
//! Defines the command tree, global flags, and shared argument groups.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// flowsync -- keep switch flow tables in line with an environment ACL
#[derive(Debug, Parser)]
#[command(
    name = "flowsync",
    version,
    about = "Reconcile ACL flows on OpenDaylight-managed switches",
    long_about = "Synchronizes the ACL of one network environment with table 0 of every\n\
        switch known to an OpenDaylight controller, using the RESTCONF northbound API.\n\n\
        Supported controller releases: BERYLLIUM, BORON, CARBON.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Controller profile to use
    #[arg(long, short = 'p', env = "FLOWSYNC_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Controller base URI (overrides profile access records)
    #[arg(long, short = 'c', env = "FLOWSYNC_CONTROLLER", global = true)]
    pub controller: Option<String>,

    /// Username for the controller's northbound API
    #[arg(long, short = 'u', env = "FLOWSYNC_USERNAME", global = true)]
    pub username: Option<String>,

    /// Controller release family (BERYLLIUM, BORON, CARBON)
    #[arg(long, env = "FLOWSYNC_VERSION", global = true)]
    pub version_tag: Option<String>,

    /// Environment id stamped into generated flows (cookie)
    #[arg(long, short = 'e', env = "FLOWSYNC_ENVIRONMENT", global = true)]
    pub environment: Option<u64>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FLOWSYNC_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "FLOWSYNC_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "FLOWSYNC_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List switches known to the controller
    #[command(alias = "n")]
    Nodes,

    /// Inspect and edit flows in table 0
    #[command(alias = "f")]
    Flows(FlowsArgs),

    /// Show what a reconcile would change, without changing it
    Diff(RulesArgs),

    /// Bring switch flow tables in line with a rule set
    Reconcile(ReconcileArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Arguments ─────────────────────────────────────────────────

/// Node selection shared by every controller-bound command.
#[derive(Debug, Args)]
pub struct NodeArgs {
    /// Target node id (repeatable); all discovered switches when omitted
    #[arg(long = "node", short = 'n', value_name = "NODE_ID")]
    pub nodes: Vec<String>,
}

#[derive(Debug, Args)]
pub struct RulesArgs {
    /// JSON rule set (`{"kind": ..., "rules": [...]}`)
    #[arg(long, short = 'r', value_name = "FILE")]
    pub rules: PathBuf,

    #[command(flatten)]
    pub nodes: NodeArgs,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  FLOWS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct FlowsArgs {
    #[command(subcommand)]
    pub command: FlowsCommand,
}

#[derive(Debug, Subcommand)]
pub enum FlowsCommand {
    /// List installed flows per node
    #[command(alias = "ls")]
    List(NodeArgs),

    /// Fetch one flow from each node
    Get {
        /// Flow id (positive integer, optionally `_<n>`)
        id: String,

        #[command(flatten)]
        nodes: NodeArgs,
    },

    /// Write one flow document to each node
    Put {
        /// Flow id (positive integer, optionally `_<n>`)
        id: String,

        /// JSON document sent verbatim as the request body
        #[arg(long, short = 'F', value_name = "FILE")]
        from_file: PathBuf,

        #[command(flatten)]
        nodes: NodeArgs,
    },

    /// Delete one flow from each node
    #[command(alias = "rm")]
    Delete {
        /// Flow id (positive integer, optionally `_<n>`)
        id: String,

        #[command(flatten)]
        nodes: NodeArgs,
    },

    /// Remove every flow in table 0
    Flush(NodeArgs),

    /// Build flows from a rule set and install all of them
    Add {
        #[command(flatten)]
        rules: RulesArgs,

        /// Flow type to build
        #[arg(long = "type", short = 't', default_value = "acl")]
        flow_type: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  RECONCILE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    #[command(flatten)]
    pub rules: RulesArgs,

    /// Stop at the first failing node instead of reporting per node
    #[arg(long)]
    pub strict: bool,

    /// Nodes reconciled at once (overrides profile)
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Display current configuration (secrets masked)
    Show,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store an access password in the system keyring
    SetPassword {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,

        /// Access record the password belongs to
        #[arg(long, default_value = "https")]
        scheme: SchemeArg,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SchemeArg {
    Https,
    Http,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

//! Command-line argument parsing.

use clap::{Args as ClapArgs, Parser, Subcommand};

/// nebula - command-line client for the cluster control plane
#[derive(Parser, Debug)]
#[command(name = "nebula")]
#[command(about = "nebula - command-line client for the cluster control plane")]
#[command(version)]
pub struct Args {
    /// Path to configuration file (optional, ~/.one/nebula.yaml if present)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    pub log_level: String,

    /// XML-RPC endpoint, e.g. http://frontend:2633/RPC2
    #[arg(long, env = "ONE_XMLRPC")]
    pub endpoint: Option<String>,

    /// Session token in user:password form
    #[arg(long)]
    pub credentials: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Print results as JSON instead of tables
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the control plane version
    Version,
    /// Manage clusters
    #[command(subcommand)]
    Cluster(ClusterCommand),
    /// Manage hosts
    #[command(subcommand)]
    Host(HostCommand),
    /// Manage virtual machines
    #[command(subcommand)]
    Vm(VmCommand),
    /// Inspect images
    #[command(subcommand)]
    Image(ImageCommand),
}

#[derive(Subcommand, Debug)]
pub enum ClusterCommand {
    /// List every cluster
    List,
    /// Show one cluster
    Show { id: i32 },
    /// Create a cluster
    Create { name: String },
    /// Delete a cluster
    Delete { id: i32 },
}

#[derive(Subcommand, Debug)]
pub enum HostCommand {
    /// List every host
    List,
    /// Show one host
    Show { id: i32 },
    /// Enable a host for scheduling
    Enable { id: i32 },
    /// Disable a host (keeps monitoring)
    Disable { id: i32 },
    /// Take a host offline
    Offline { id: i32 },
}

/// Pool selection shared by `list` commands.
#[derive(ClapArgs, Debug, Clone)]
pub struct PoolArgs {
    /// Ownership scope: all, mine, mine-and-group, group
    #[arg(long, default_value = "all")]
    pub scope: String,

    /// Only objects owned by this user ID (overrides --scope)
    #[arg(long)]
    pub user: Option<i32>,

    /// 1-based page number
    #[arg(long, requires = "page_size")]
    pub page: Option<i32>,

    /// Page size
    #[arg(long, requires = "page")]
    pub page_size: Option<i32>,
}

#[derive(Subcommand, Debug)]
pub enum VmCommand {
    /// List virtual machines
    List {
        #[command(flatten)]
        pool: PoolArgs,

        /// Only VMs in this state (e.g. active, poweroff, done)
        #[arg(long)]
        state: Option<String>,
    },
    /// Show one virtual machine
    Show { id: i32 },
    /// Run a life-cycle action (terminate, poweroff, resume, ...)
    Action { id: i32, action: String },
    /// Change permissions from an octal string, e.g. 640
    Chmod { id: i32, octal: String },
    /// Change owner and/or group
    Chown {
        id: i32,
        #[arg(long)]
        user: Option<i32>,
        #[arg(long)]
        group: Option<i32>,
    },
    /// Change capacity
    Resize {
        id: i32,
        #[arg(long)]
        cpu: Option<f64>,
        #[arg(long)]
        vcpu: Option<u32>,
        #[arg(long)]
        memory_mb: Option<u64>,
        /// Fail when the host lacks capacity
        #[arg(long)]
        enforce: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ImageCommand {
    /// List images
    List {
        #[command(flatten)]
        pool: PoolArgs,
    },
    /// Show one image
    Show { id: i32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vm_list() {
        let args = Args::try_parse_from([
            "nebula", "--json", "vm", "list", "--scope", "mine", "--state", "active", "--page", "2",
            "--page-size", "10",
        ])
        .unwrap();

        assert!(args.json);
        match args.command {
            Command::Vm(VmCommand::List { pool, state }) => {
                assert_eq!(pool.scope, "mine");
                assert_eq!(pool.page, Some(2));
                assert_eq!(pool.page_size, Some(10));
                assert_eq!(state.as_deref(), Some("active"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_page_requires_size() {
        assert!(Args::try_parse_from(["nebula", "image", "list", "--page", "2"]).is_err());
    }

    #[test]
    fn test_cluster_create() {
        let args = Args::try_parse_from(["nebula", "-l", "debug", "cluster", "create", "my_cluster"]).unwrap();
        assert_eq!(args.log_level, "debug");
        assert!(matches!(
            args.command,
            Command::Cluster(ClusterCommand::Create { ref name }) if name == "my_cluster"
        ));
    }
}

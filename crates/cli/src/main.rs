//! skiff - content-addressed bundling for serverless deployments
//!
//! Thin operator frontend over the library crates: fingerprint a source
//! tree, inspect a build plan, or execute a bundle into an output
//! directory. The declarative service assembly in skiff-cloud is meant
//! to be driven from deployment programs, not from here.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use skiff_cloud::{FunctionProps, GatewayProps, Service, Stack};
use skiff_core::{BuildConfig, BuildStrategy, bundle, fingerprint, plan_build};

/// skiff - content-addressed build cache for serverless deployment artifacts
#[derive(Parser)]
#[command(name = "skiff")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the identity hash of a source tree
    Fingerprint {
        /// Source directory to fingerprint
        path: PathBuf,
    },

    /// Show the resolved build instruction set without executing it
    Plan {
        /// Root of the source package
        path: PathBuf,

        /// Buildable sub-package within the root (default: the root itself)
        #[arg(short, long, default_value = ".")]
        entry: PathBuf,

        #[command(flatten)]
        build: BuildOpts,
    },

    /// Compile the deployment artifact into an output directory
    Bundle {
        /// Root of the source package
        path: PathBuf,

        /// Buildable sub-package within the root (default: the root itself)
        #[arg(short, long, default_value = ".")]
        entry: PathBuf,

        /// Directory receiving the compiled binary
        #[arg(short, long)]
        out: PathBuf,

        #[command(flatten)]
        build: BuildOpts,
    },

    /// Assemble a service and print the declaration document
    Synth {
        /// Stack name
        #[arg(long)]
        name: String,

        /// Route as <path>=<source_root>[:<entry>]; repeatable
        #[arg(long = "route", required = true)]
        routes: Vec<String>,

        /// Cognito user pool ARN enabling OAuth2; repeatable
        #[arg(long = "user-pool")]
        user_pools: Vec<String>,

        /// Custom domain host (requires --tls-arn)
        #[arg(long, requires = "tls_arn")]
        host: Option<String>,

        /// TLS certificate ARN for the custom domain
        #[arg(long)]
        tls_arn: Option<String>,

        #[command(flatten)]
        build: BuildOpts,
    },
}

/// Overrides for the build configuration resolved from the environment.
#[derive(Args)]
struct BuildOpts {
    /// Host build root (defaults to $GOPATH, then /go)
    #[arg(long)]
    build_root: Option<PathBuf>,

    /// Compiler program for local builds
    #[arg(long)]
    compiler: Option<String>,

    /// Container runtime program for hermetic builds
    #[arg(long)]
    runtime: Option<String>,

    /// Skip the host toolchain and build in a container
    #[arg(long)]
    container: bool,
}

impl BuildOpts {
    fn into_config(self) -> BuildConfig {
        let mut config = BuildConfig::from_env();
        if let Some(build_root) = self.build_root {
            config.build_root = build_root;
        }
        if let Some(compiler) = self.compiler {
            config.compiler = compiler;
        }
        if let Some(runtime) = self.runtime {
            config.container_runtime = runtime;
        }
        if self.container {
            config.prefer_local = false;
        }
        config
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .without_time()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fingerprint { path } => cmd_fingerprint(&path),
        Commands::Plan { path, entry, build } => cmd_plan(&path, &entry, build.into_config()),
        Commands::Bundle {
            path,
            entry,
            out,
            build,
        } => cmd_bundle(&path, &entry, &out, build.into_config()),
        Commands::Synth {
            name,
            routes,
            user_pools,
            host,
            tls_arn,
            build,
        } => cmd_synth(&name, &routes, user_pools, host, tls_arn, build.into_config()),
    }
}

fn cmd_fingerprint(path: &PathBuf) -> Result<()> {
    let digest = fingerprint(path)
        .with_context(|| format!("failed to fingerprint {}", path.display()))?;
    println!("{digest}");
    Ok(())
}

fn cmd_plan(path: &PathBuf, entry: &PathBuf, config: BuildConfig) -> Result<()> {
    let plan = plan_build(&config, path, entry);
    let json = serde_json::to_string_pretty(&plan).context("failed to serialize build plan")?;
    println!("{json}");
    Ok(())
}

fn cmd_bundle(path: &PathBuf, entry: &PathBuf, out: &PathBuf, config: BuildConfig) -> Result<()> {
    info!(path = %path.display(), entry = %entry.display(), "bundling deployment artifact");

    std::fs::create_dir_all(out)
        .with_context(|| format!("failed to create output directory {}", out.display()))?;

    let digest = fingerprint(path)
        .with_context(|| format!("failed to fingerprint {}", path.display()))?;

    let plan = plan_build(&config, path, entry);
    let strategy = bundle(&config, &plan, out)
        .with_context(|| format!("failed to build {}", plan.source.display()))?;

    let sandbox = match strategy {
        BuildStrategy::Local => "local",
        BuildStrategy::Container => "container",
    };
    println!("Checksum: {digest}");
    println!("Strategy: {sandbox}");
    println!("Artifact: {}", out.join(skiff_core::OUTPUT_BINARY).display());
    Ok(())
}

fn cmd_synth(
    name: &str,
    routes: &[String],
    user_pools: Vec<String>,
    host: Option<String>,
    tls_arn: Option<String>,
    config: BuildConfig,
) -> Result<()> {
    info!(stack = %name, routes = routes.len(), "synthesizing declaration document");

    let mut gateway = GatewayProps::default();
    if let (Some(host), Some(tls_arn)) = (host, tls_arn) {
        gateway = gateway.with_domain(&host, &tls_arn);
    }

    let mut service = Service::new(gateway);
    if !user_pools.is_empty() {
        service = service.enable_oauth2(user_pools);
    }

    for route in routes {
        let (path, source) = route
            .split_once('=')
            .with_context(|| format!("route '{route}' is not of the form <path>=<source>"))?;
        let (root, entry) = match source.split_once(':') {
            Some((root, entry)) => (root, entry),
            None => (source, "."),
        };
        service = service.add_resource(
            path,
            FunctionProps::go(std::path::Path::new(root), std::path::Path::new(entry)),
            None,
        );
    }

    let mut stack = Stack::new(name);
    service
        .register(&mut stack, &config)
        .with_context(|| format!("failed to assemble service '{name}'"))?;

    let json = serde_json::to_string_pretty(&stack.synth())
        .context("failed to serialize declaration document")?;
    println!("{json}");
    Ok(())
}

// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Build automation for pgbouncer-kube
//!
//! Usage: cargo xtask <command>
//!
//! Available commands:
//! - build: Build the project
//! - test: Run tests
//! - smoke: Render the demo manifests with the debug binary
//! - dist: Create distribution packages
//! - install: Install to system
//! - ci: Run CI checks

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use xshell::{cmd, Shell};

const BINARY: &str = "pgbouncer-kube";

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation for pgbouncer-kube")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the project
    Build {
        /// Build in release mode
        #[arg(long)]
        release: bool,
    },
    /// Run tests
    Test {
        /// Run only integration tests
        #[arg(long)]
        integration: bool,
    },
    /// Render demos/pooler.yaml and demos/cluster.yaml
    Smoke,
    /// Create distribution packages
    Dist {
        /// Target triple (e.g., x86_64-unknown-linux-gnu)
        #[arg(long)]
        target: Option<String>,
    },
    /// Install to system
    Install {
        /// Installation prefix (default: /usr/local)
        #[arg(long, default_value = "/usr/local")]
        prefix: String,
    },
    /// Run CI checks (format, clippy, test, smoke)
    Ci,
    /// Format code
    Format {
        /// Check formatting without modifying files
        #[arg(long)]
        check: bool,
    },
    /// Run clippy
    Clippy,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;

    sh.change_dir(project_root()?);

    match cli.command {
        Commands::Build { release } => build(&sh, release),
        Commands::Test { integration } => test(&sh, integration),
        Commands::Smoke => smoke(&sh),
        Commands::Dist { target } => dist(&sh, target),
        Commands::Install { prefix } => install(&sh, &prefix),
        Commands::Ci => ci(&sh),
        Commands::Format { check } => format(&sh, check),
        Commands::Clippy => clippy(&sh),
    }
}

fn build(sh: &Shell, release: bool) -> Result<()> {
    println!("🔨 Building {}...", BINARY);

    if release {
        cmd!(sh, "cargo build --release").run()?;
        println!("✅ Release build completed: target/release/{}", BINARY);
    } else {
        cmd!(sh, "cargo build").run()?;
        println!("✅ Debug build completed: target/debug/{}", BINARY);
    }

    Ok(())
}

fn test(sh: &Shell, integration: bool) -> Result<()> {
    println!("🧪 Running tests...");

    if integration {
        cmd!(sh, "cargo test --test '*'").run()?;
    } else {
        cmd!(sh, "cargo test --all").run()?;
    }

    println!("✅ All tests passed");
    Ok(())
}

fn smoke(sh: &Shell) -> Result<()> {
    println!("💨 Rendering demo pooler...");

    let output = cmd!(
        sh,
        "cargo run --quiet --bin {BINARY} -- render --pooler demos/pooler.yaml --cluster demos/cluster.yaml"
    )
    .read()
    .context("Failed to render demo manifests")?;

    for expected in ["kind: Deployment", "bootstrap-controller", "poolerSpecHash"] {
        if !output.contains(expected) {
            anyhow::bail!("rendered deployment is missing '{}'", expected);
        }
    }

    println!("✅ Demo pooler rendered");
    Ok(())
}

fn dist(sh: &Shell, target: Option<String>) -> Result<()> {
    println!("📦 Creating distribution package...");

    if let Some(ref target_triple) = target {
        cmd!(sh, "cargo build --release --target {target_triple}").run()?;
    } else {
        cmd!(sh, "cargo build --release").run()?;
    }

    let root = project_root()?;
    let dist_dir = root.join("dist");
    sh.create_dir(&dist_dir)?;

    let binary_src = if let Some(ref target_triple) = target {
        root.join(format!("target/{}/release/{}", target_triple, BINARY))
    } else {
        root.join(format!("target/release/{}", BINARY))
    };

    sh.copy_file(&binary_src, dist_dir.join(BINARY))?;

    let version = env!("CARGO_PKG_VERSION");
    let archive_name = format!("{}-{}.tar.gz", BINARY, version);

    cmd!(sh, "tar -czf {archive_name} -C dist {BINARY}")
        .run()
        .context("Failed to create tarball")?;

    println!("✅ Distribution package created: {}", archive_name);
    Ok(())
}

fn install(sh: &Shell, prefix: &str) -> Result<()> {
    println!("📥 Installing {} to {}...", BINARY, prefix);

    let binary = project_root()?.join(format!("target/release/{}", BINARY));
    if !binary.exists() {
        println!("Building release binary first...");
        cmd!(sh, "cargo build --release").run()?;
    }

    let bin_dir = Path::new(prefix).join("bin");
    sh.create_dir(&bin_dir)?;

    let install_path = bin_dir.join(BINARY);
    sh.copy_file(&binary, &install_path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&install_path, std::fs::Permissions::from_mode(0o755))?;
    }

    println!("✅ Installed to: {}", install_path.display());
    Ok(())
}

fn ci(sh: &Shell) -> Result<()> {
    println!("🔍 Running CI checks...");

    println!("\n📝 Checking formatting...");
    format(sh, true)?;

    println!("\n🔧 Running clippy...");
    clippy(sh)?;

    println!("\n🧪 Running tests...");
    test(sh, false)?;

    println!("\n💨 Smoke rendering...");
    smoke(sh)?;

    println!("\n✅ All CI checks passed!");
    Ok(())
}

fn format(sh: &Shell, check: bool) -> Result<()> {
    if check {
        cmd!(sh, "cargo fmt --all -- --check").run()?;
        println!("✅ Code formatting is correct");
    } else {
        cmd!(sh, "cargo fmt --all").run()?;
        println!("✅ Code formatted");
    }
    Ok(())
}

fn clippy(sh: &Shell) -> Result<()> {
    cmd!(sh, "cargo clippy --all-targets --all-features -- -D warnings").run()?;
    println!("✅ Clippy checks passed");
    Ok(())
}

fn project_root() -> Result<PathBuf> {
    Path::new(&env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(1)
        .map(Path::to_path_buf)
        .context("xtask must live one level below the workspace root")
}

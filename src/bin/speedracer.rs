// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
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

use std::path::{Path, PathBuf};

use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use speedracer::core::config::MachineConfig;
use speedracer::core::error::{EmulatorError, Result};
use speedracer::core::system::System;

/// PROM image location relative to a checkout root
const DEFAULT_PROM_REL_PATH: &str = "roms/ip30prom.rev4.9.bin";

/// SGI Octane (IP30) CPU core emulator
#[derive(Parser)]
#[command(name = "speedracer")]
#[command(about = "SGI Octane MIPS core emulator", long_about = None)]
struct Args {
    /// Path to the PROM image (defaults to roms/ip30prom.rev4.9.bin)
    prom_file: Option<PathBuf>,

    /// Number of instructions to execute
    #[arg(short = 'n', long, default_value = "100000")]
    instructions: u64,

    /// Machine configuration file (TOML)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Override the number of TLB entries
    #[arg(long)]
    tlb_size: Option<usize>,

    /// Write an execution trace to this file
    #[arg(short = 't', long)]
    trace: Option<String>,

    /// Stop tracing after this many instructions (0 = unlimited)
    #[arg(long, default_value = "0")]
    trace_limit: usize,

    /// Print a hex+ASCII dump of the first bytes of the PROM and exit
    #[arg(
        long,
        value_name = "BYTES",
        num_args = 0..=1,
        default_missing_value = "256"
    )]
    hexdump: Option<usize>,

    /// Print the final CPU state as JSON
    #[arg(long)]
    json: bool,
}

/// Locate the PROM image
///
/// An explicit path wins. Otherwise `$SPEEDRACER_ROOT`, the working
/// directory and its parent are searched, and the relative default is
/// returned if none of them has the image.
fn resolve_prom_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }

    if let Ok(root) = std::env::var("SPEEDRACER_ROOT") {
        let candidate = Path::new(&root).join(DEFAULT_PROM_REL_PATH);
        if candidate.exists() {
            return candidate;
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        let candidate = cwd.join(DEFAULT_PROM_REL_PATH);
        if candidate.exists() {
            return candidate;
        }
        if let Some(parent) = cwd.parent() {
            let candidate = parent.join(DEFAULT_PROM_REL_PATH);
            if candidate.exists() {
                return candidate;
            }
        }
    }

    PathBuf::from(DEFAULT_PROM_REL_PATH)
}

/// Print `data` like `hexdump -C`, 16 bytes per row
fn print_hexdump(data: &[u8], max_bytes: usize) {
    let len = max_bytes.min(data.len());

    for (row, chunk) in data[..len].chunks(16).enumerate() {
        let mut hex = String::with_capacity(16 * 3);
        let mut ascii = String::with_capacity(16);
        for byte in chunk {
            hex.push_str(&format!("{:02x} ", byte));
            ascii.push(if byte.is_ascii_graphic() || *byte == b' ' {
                *byte as char
            } else {
                '.'
            });
        }
        println!("{:08x}: {:<48}  {}", row * 16, hex, ascii);
    }
}

fn load_config(args: &Args) -> Result<MachineConfig> {
    let mut config = match &args.config {
        Some(path) => MachineConfig::from_file(path)?,
        None => MachineConfig::default(),
    };

    if let Some(tlb_size) = args.tlb_size {
        config.tlb_size = tlb_size;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    // .env is optional
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to read .env: {}", e);
        }
    }

    // Initialize logger with default level INFO
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("speedracer v{}", env!("CARGO_PKG_VERSION"));
    info!("SGI Octane (IP30) emulator core");

    let args = Args::parse();
    let config = load_config(&args)?;

    let prom_path = resolve_prom_path(args.prom_file.clone());
    let prom_path = prom_path
        .to_str()
        .ok_or_else(|| EmulatorError::PromNotFound(prom_path.display().to_string()))?
        .to_string();

    info!("Loading PROM from: {}", prom_path);

    let mut system = System::new(&config)?;
    let size = match system.load_prom(&prom_path) {
        Ok(size) => size,
        Err(e) => {
            error!("Failed to load PROM: {}", e);
            return Err(e);
        }
    };
    info!(
        "PROM loaded: {} bytes at 0x{:08X}",
        size, config.reset_vector
    );

    if let Some(bytes) = args.hexdump {
        print_hexdump(system.bus().prom(), bytes.min(size));
        return Ok(());
    }

    if let Some(trace_path) = &args.trace {
        system.enable_tracing(trace_path, args.trace_limit)?;
        info!("Tracing to {}", trace_path);
    }

    info!("Starting emulation...");
    system.reset();

    let total = args.instructions;
    let log_interval = (total / 10).max(1);
    let mut remaining = total;
    let mut exceptions = 0;

    while remaining > 0 {
        let chunk = remaining.min(log_interval);
        let summary = system.run(chunk);
        exceptions += summary.exceptions;
        remaining -= chunk;

        if remaining > 0 {
            info!(
                "Progress: {}/{} steps | PC: 0x{:08X} | exceptions: {}",
                total - remaining,
                total,
                system.pc(),
                exceptions
            );
        }
    }

    if exceptions > 0 {
        warn!("{} exceptions taken during run", exceptions);
    }

    info!("Emulation finished");
    info!("Total steps: {}", system.steps());
    info!("Final PC: 0x{:08X}", system.pc());

    if args.json {
        match serde_json::to_string_pretty(&system.state()) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to serialize CPU state: {}", e),
        }
    } else {
        system.cpu().dump_registers();
    }

    Ok(())
}

/*
 * This file is part of Nitroctl.
 *
 * Copyright (C) 2025 Nitroctl contributors
 *
 * Nitroctl is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Nitroctl is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Nitroctl. If not, see <https://www.gnu.org/licenses/>.
 */

use std::env;
use std::process;

use nitroctl::config;
use nitroctl::ec::EcController;
use nitroctl::logger;
use nitroctl::status::FanInfo;
use nitroctl::system;

fn usage() -> ! {
    eprintln!("Usage: nitroctl [--json] [--logging] <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  status                     Show fan mode, duty and RPM (default)");
    eprintln!("  boost on|off               Cooler Boost for both fans");
    eprintln!("  boost <cpu> <gpu>          Cooler Boost per fan, e.g. boost on off");
    eprintln!("  custom <pct>               Custom duty 0-100 for both fans");
    eprintln!("  custom <cpu pct> <gpu pct> Custom duty per fan");
    process::exit(1);
}

fn parse_switch(s: &str) -> Option<bool> {
    match s {
        "on" => Some(true),
        "off" => Some(false),
        _ => None,
    }
}

fn parse_percent(s: &str) -> Option<u8> {
    s.parse::<u8>().ok().filter(|p| *p <= 100)
}

fn fmt_percent(v: Option<u8>) -> String {
    v.map(|p| format!("{}%", p)).unwrap_or_else(|| "n/a".to_string())
}

fn fmt_rpm(v: Option<u16>) -> String {
    v.map(|r| format!("{} RPM", r)).unwrap_or_else(|| "n/a".to_string())
}

fn fmt_flag(v: Option<bool>) -> String {
    match v {
        Some(true) => "on".to_string(),
        Some(false) => "off".to_string(),
        None => "unknown".to_string(),
    }
}

fn print_status(info: &FanInfo, json_output: bool) -> anyhow::Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(info)?);
        return Ok(());
    }
    let product = system::read_product_name();
    if !product.is_empty() {
        println!("Model:        {}", product);
    }
    println!("Fan mode:     {}", info.mode);
    println!("Cooler boost: {}", fmt_flag(info.cooler_boost));
    println!(
        "CPU fan:      {} / {} (boost {})",
        fmt_percent(info.cpu_percent),
        fmt_rpm(info.cpu_rpm),
        fmt_flag(info.cpu_cooler_boost)
    );
    println!(
        "GPU fan:      {} / {} (boost {})",
        fmt_percent(info.gpu_percent),
        fmt_rpm(info.gpu_rpm),
        fmt_flag(info.gpu_cooler_boost)
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Check if running as root
    if !system::is_root() {
        eprintln!("Error: nitroctl requires root privileges to access the embedded controller.");
        eprintln!(
            "Please run with: sudo {}",
            env::args().next().unwrap_or_else(|| "nitroctl".to_string())
        );
        process::exit(1);
    }

    // Gather args once
    let args: Vec<String> = env::args().collect();
    let logging_enabled = args.iter().any(|a| a == "--logging");
    let json_output = args.iter().any(|a| a == "--json");
    let positional: Vec<String> = args[1..]
        .iter()
        .filter(|a| !a.starts_with("--"))
        .cloned()
        .collect();

    let cfg = config::load_saved_config();

    // Optional logging to /etc/nitroctl/logs.json
    if logging_enabled || cfg.logging {
        logger::init_logging();
        logger::log_event("startup", serde_json::json!({ "args": args }));
    }

    let mut ctl = EcController::from_config(&cfg);

    let (available, msg) = ctl.is_available();
    if !available {
        eprintln!("{}", msg);
        process::exit(1);
    }

    match positional.first().map(String::as_str) {
        None | Some("status") => {
            let info = ctl.get_fan_info();
            print_status(&info, json_output)?;
        }
        Some("boost") => {
            let applied = match (positional.get(1), positional.get(2)) {
                (Some(v), None) => match parse_switch(v) {
                    Some(on) => ctl.set_cooler_boost(on),
                    None => usage(),
                },
                (Some(c), Some(g)) => match (parse_switch(c), parse_switch(g)) {
                    (Some(cpu), Some(gpu)) => ctl.set_cooler_boost_individual(cpu, gpu),
                    _ => usage(),
                },
                _ => usage(),
            };
            if !applied {
                eprintln!("error: failed to apply cooler boost setting");
                process::exit(1);
            }
            println!("Cooler boost updated.");
        }
        Some("custom") => {
            let applied = match (positional.get(1), positional.get(2)) {
                (Some(p), None) => match parse_percent(p) {
                    Some(pct) => ctl.set_custom_fan(pct),
                    None => {
                        eprintln!("error: percent must be an integer in 0..=100");
                        process::exit(1);
                    }
                },
                (Some(c), Some(g)) => match (parse_percent(c), parse_percent(g)) {
                    (Some(cpu), Some(gpu)) => ctl.set_custom_fans(cpu, gpu),
                    _ => {
                        eprintln!("error: percents must be integers in 0..=100");
                        process::exit(1);
                    }
                },
                _ => usage(),
            };
            if !applied {
                eprintln!("error: failed to apply custom fan speed");
                process::exit(1);
            }
            println!("Custom fan speed applied.");
        }
        Some(other) => {
            eprintln!("error: unknown command '{}'", other);
            usage();
        }
    }

    Ok(())
}
